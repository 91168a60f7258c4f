//! Optimization backend seam
//!
//! The adapter talks to any ask-tell optimizer through two traits:
//! [`BackendProvider`] reports whether the backend can run here and creates
//! instances, [`OptimizerBackend`] is one running optimization. Parameter
//! maps crossing this seam are keyed by sanitized names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ParameterBounds;
use crate::config::OptimizerConfig;
use crate::table::Value;
use crate::{Error, Result};

/// Parameter assignment keyed by parameter name.
pub type Parameters = BTreeMap<String, Value>;

/// Result of the capability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    /// Backend can be used
    Available,
    /// Backend cannot be used, with the reason shown to the user
    Unavailable(String),
}

impl Availability {
    /// Whether the backend can be used.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::Available)
    }
}

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    /// Lower responses are better
    Minimize,
    /// Higher responses are better
    #[default]
    Maximize,
}

impl Objective {
    /// `Minimize` when `minimize` is true.
    #[must_use]
    pub const fn from_minimize(minimize: bool) -> Self {
        if minimize {
            Self::Minimize
        } else {
            Self::Maximize
        }
    }

    /// Whether `candidate` beats `incumbent`.
    #[must_use]
    pub fn improves(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Self::Minimize => candidate < incumbent,
            Self::Maximize => candidate > incumbent,
        }
    }
}

/// One named parameter of a search space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    /// Backend-safe name
    pub name: String,
    /// Admissible values
    pub bounds: ParameterBounds,
}

/// Parameters and objective handed to a backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    parameters: Vec<ParameterSpec>,
    objective: Objective,
}

impl SearchSpace {
    /// Create a search space.
    ///
    /// # Errors
    /// Returns error if there are no parameters, a name repeats, a range is
    /// inverted or non-finite, or a choice is empty.
    pub fn new(parameters: Vec<ParameterSpec>, objective: Objective) -> Result<Self> {
        if parameters.is_empty() {
            return Err(Error::InvalidInput(
                "search space needs at least one parameter".to_string(),
            ));
        }
        for (i, spec) in parameters.iter().enumerate() {
            if parameters[..i].iter().any(|p| p.name == spec.name) {
                return Err(Error::InvalidInput(format!(
                    "duplicate parameter {}",
                    spec.name
                )));
            }
            match &spec.bounds {
                ParameterBounds::Range { lower, upper }
                    if !(lower.is_finite() && upper.is_finite() && lower <= upper) =>
                {
                    return Err(Error::InvalidInput(format!(
                        "parameter {} has invalid range [{lower}, {upper}]",
                        spec.name
                    )));
                }
                ParameterBounds::Choice { values } if values.is_empty() => {
                    return Err(Error::InvalidInput(format!(
                        "parameter {} has no choices",
                        spec.name
                    )));
                }
                _ => {}
            }
        }
        Ok(Self {
            parameters,
            objective,
        })
    }

    /// Parameters in declaration order.
    #[must_use]
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    /// Optimization direction.
    #[must_use]
    pub const fn objective(&self) -> Objective {
        self.objective
    }

    /// Parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Always false for a validated space.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

/// A running ask-tell optimization.
pub trait OptimizerBackend: Send + Sync {
    /// Propose the next parameter assignment.
    ///
    /// # Errors
    /// Returns error if the backend fails to produce a candidate.
    fn suggest(&mut self) -> Result<Parameters>;

    /// Record the response measured for `parameters`.
    ///
    /// # Errors
    /// Returns error if the parameters do not match the search space.
    fn observe(&mut self, parameters: &Parameters, value: f64) -> Result<()>;

    /// Number of recorded observations.
    fn observation_count(&self) -> usize;
}

/// Factory and capability check for a backend.
pub trait BackendProvider: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Whether the backend can run in this build and environment.
    fn availability(&self) -> Availability;

    /// Start an optimization over `space`.
    ///
    /// # Errors
    /// Returns error if the backend cannot be created.
    fn create(
        &self,
        space: SearchSpace,
        config: &OptimizerConfig,
    ) -> Result<Box<dyn OptimizerBackend>>;
}

/// Provider that is never available.
#[derive(Debug, Clone)]
pub struct UnavailableProvider {
    reason: String,
}

impl UnavailableProvider {
    /// Provider reporting `reason`.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl BackendProvider for UnavailableProvider {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn availability(&self) -> Availability {
        Availability::Unavailable(self.reason.clone())
    }

    fn create(
        &self,
        _space: SearchSpace,
        _config: &OptimizerConfig,
    ) -> Result<Box<dyn OptimizerBackend>> {
        Err(Error::BackendUnavailable(self.reason.clone()))
    }
}

/// Built-in provider: the Gaussian-process backend when compiled with the
/// `bayes` feature, otherwise an [`UnavailableProvider`].
#[must_use]
pub fn default_provider() -> Box<dyn BackendProvider> {
    #[cfg(feature = "bayes")]
    {
        Box::new(super::GaussianProcessProvider)
    }
    #[cfg(not(feature = "bayes"))]
    {
        Box::new(UnavailableProvider::new(
            "Bayesian optimization platform not available; rebuild with `--features bayes`",
        ))
    }
}
