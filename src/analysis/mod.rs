//! Regression analysis of screening results
//!
//! ## Pipeline
//!
//! ```text
//! FactorRoles + ModelType ──> TermSet ──render──> formula text
//!                                │
//! Dataset ──> DesignEncoder (intercept, treatment coding) ──> X
//!                                                              │
//!                                 OLS via SVD (nalgebra) <─────┘
//!                                        │
//!                      coefficients, t/F tests (statrs), R², AIC/BIC
//! ```
//!
//! [`RegressionEngine`] is the stateful facade: `set_data`, then `fit`,
//! then query significant factors or predict. Main effects only need data.
//!
//! ```rust
//! use scout_doe::analysis::{ModelType, RegressionEngine};
//! use scout_doe::roles::FactorRoles;
//! use scout_doe::table::Dataset;
//!
//! # fn main() -> scout_doe::Result<()> {
//! let data = Dataset::new()
//!     .with_numeric("NaCl", vec![50.0, 100.0, 150.0, 200.0, 250.0])?
//!     .with_numeric("Tm", vec![51.0, 53.1, 54.9, 57.0, 59.1])?;
//!
//! let mut engine = RegressionEngine::new();
//! engine.set_data(&data, FactorRoles::numeric(["NaCl"])?, "Tm")?;
//! let model = engine.fit(ModelType::Linear)?;
//! assert!(model.statistics().r_squared > 0.99);
//! assert_eq!(engine.significant_factors(0.05)?, vec!["Q('NaCl')"]);
//! # Ok(())
//! # }
//! ```

mod effects;
mod encoding;
mod model;
mod ols;
mod terms;

pub use effects::{main_effects, LevelEffect, MainEffect};
pub use model::{Coefficient, ModelStatistics, RegressionModel};
pub use terms::{quote, Term, TermSet, INTERCEPT};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::{EngineConfig, DEFAULT_SIGNIFICANCE_LEVEL};
use crate::roles::FactorRoles;
use crate::table::Dataset;
use crate::{Error, Result};

/// Regression model family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    /// Main effects
    Linear,
    /// Main effects and all two-way interactions
    Interactions,
    /// Interactions plus squared numeric factors
    Quadratic,
    /// Main effects plus squared numeric factors
    PureQuadratic,
}

impl ModelType {
    /// All families, simplest first.
    pub const ALL: [Self; 4] = [
        Self::Linear,
        Self::Interactions,
        Self::Quadratic,
        Self::PureQuadratic,
    ];

    /// Identifier accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Interactions => "interactions",
            Self::Quadratic => "quadratic",
            Self::PureQuadratic => "purequadratic",
        }
    }

    /// One-line description for pickers.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Linear => "Main effects only",
            Self::Interactions => "Main effects + 2-way interactions",
            Self::Quadratic => "Main effects + interactions + squared terms",
            Self::PureQuadratic => "Main effects + squared terms",
        }
    }

    pub(crate) const fn includes_interactions(self) -> bool {
        matches!(self, Self::Interactions | Self::Quadratic)
    }

    pub(crate) const fn includes_squares(self) -> bool {
        matches!(self, Self::Quadratic | Self::PureQuadratic)
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == wanted)
            .ok_or_else(|| Error::InvalidModelType(s.to_string()))
    }
}

#[derive(Debug, Clone)]
struct Observations {
    data: Dataset,
    roles: FactorRoles,
    response: String,
}

/// Stateful regression session over one observed dataset.
#[derive(Debug, Clone)]
pub struct RegressionEngine {
    observations: Option<Observations>,
    model: Option<RegressionModel>,
    significance_level: f64,
}

impl Default for RegressionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RegressionEngine {
    /// Create an engine with α = 0.05.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            observations: None,
            model: None,
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
        }
    }

    /// Create an engine using the configured significance level.
    #[must_use]
    pub const fn from_config(config: &EngineConfig) -> Self {
        Self {
            observations: None,
            model: None,
            significance_level: config.significance_level,
        }
    }

    /// Store a copy of the observed data. Discards any fitted model.
    ///
    /// # Errors
    /// Returns error if a factor or the response column is missing, or the
    /// response is also declared as a factor.
    pub fn set_data(&mut self, data: &Dataset, roles: FactorRoles, response: &str) -> Result<()> {
        if roles.role(response).is_some() {
            return Err(Error::InvalidInput(format!(
                "response column {response} is also declared as a factor"
            )));
        }
        data.require_columns(roles.names().chain(std::iter::once(response)))?;
        self.observations = Some(Observations {
            data: data.clone(),
            roles,
            response: response.to_string(),
        });
        self.model = None;
        Ok(())
    }

    /// Whether data has been set.
    #[must_use]
    pub const fn has_data(&self) -> bool {
        self.observations.is_some()
    }

    /// Stored dataset.
    #[must_use]
    pub fn data(&self) -> Option<&Dataset> {
        self.observations.as_ref().map(|o| &o.data)
    }

    /// Terms `model_type` would use on the stored factors.
    ///
    /// # Errors
    /// Returns [`Error::NoData`] before `set_data`.
    pub fn build_terms(&self, model_type: ModelType) -> Result<TermSet> {
        let obs = self.observations.as_ref().ok_or(Error::NoData("build_terms"))?;
        Ok(TermSet::build(&obs.roles, &obs.response, model_type))
    }

    /// Fit and keep the model.
    ///
    /// # Errors
    /// Returns [`Error::NoData`] before `set_data`, otherwise see
    /// [`RegressionModel::fit_with_alpha`].
    pub fn fit(&mut self, model_type: ModelType) -> Result<&RegressionModel> {
        let obs = self.observations.as_ref().ok_or(Error::NoData("fit"))?;
        let model = RegressionModel::fit_with_alpha(
            &obs.data,
            &obs.roles,
            &obs.response,
            model_type,
            self.significance_level,
        )?;
        Ok(self.model.insert(model))
    }

    /// Most recent model.
    #[must_use]
    pub const fn model(&self) -> Option<&RegressionModel> {
        self.model.as_ref()
    }

    /// Terms with `p < alpha`, never the intercept.
    ///
    /// # Errors
    /// Returns [`Error::NoModel`] before `fit`.
    pub fn significant_factors(&self, alpha: f64) -> Result<Vec<String>> {
        let model = self.model.as_ref().ok_or(Error::NoModel("significant_factors"))?;
        Ok(model
            .significant_terms(alpha)
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    /// Per-level response summaries for every factor.
    ///
    /// # Errors
    /// Returns [`Error::NoData`] before `set_data`.
    pub fn main_effects(&self) -> Result<Vec<MainEffect>> {
        let obs = self.observations.as_ref().ok_or(Error::NoData("main_effects"))?;
        main_effects(&obs.data, &obs.roles, &obs.response)
    }

    /// Predict with the most recent model.
    ///
    /// # Errors
    /// Returns [`Error::NoModel`] before `fit`, otherwise see
    /// [`RegressionModel::predict`].
    pub fn predict(&self, data: &Dataset) -> Result<Vec<f64>> {
        self.model
            .as_ref()
            .ok_or(Error::NoModel("predict"))?
            .predict(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_type_parse() {
        assert_eq!("Quadratic".parse::<ModelType>().unwrap(), ModelType::Quadratic);
        assert_eq!(" purequadratic ".parse::<ModelType>().unwrap(), ModelType::PureQuadratic);
        assert!(matches!("cubic".parse::<ModelType>(), Err(Error::InvalidModelType(_))));
        for model in ModelType::ALL {
            assert_eq!(model.to_string().parse::<ModelType>().unwrap(), model);
        }
    }

    #[test]
    fn test_calls_out_of_order() {
        let mut engine = RegressionEngine::new();
        assert!(matches!(engine.fit(ModelType::Linear), Err(Error::NoData(_))));
        assert!(matches!(engine.main_effects(), Err(Error::NoData(_))));
        assert!(matches!(engine.significant_factors(0.05), Err(Error::NoModel(_))));
        assert!(matches!(engine.predict(&Dataset::new()), Err(Error::NoModel(_))));
    }

    #[test]
    fn test_set_data_discards_model() {
        let data = Dataset::new()
            .with_numeric("x", vec![1.0, 2.0, 3.0, 4.0])
            .unwrap()
            .with_numeric("y", vec![1.0, 2.1, 2.9, 4.2])
            .unwrap();
        let mut engine = RegressionEngine::new();
        engine.set_data(&data, FactorRoles::numeric(["x"]).unwrap(), "y").unwrap();
        engine.fit(ModelType::Linear).unwrap();
        assert!(engine.model().is_some());

        engine.set_data(&data, FactorRoles::numeric(["x"]).unwrap(), "y").unwrap();
        assert!(engine.model().is_none());
    }

    #[test]
    fn test_response_cannot_be_factor() {
        let data = Dataset::new().with_numeric("y", vec![1.0]).unwrap();
        let mut engine = RegressionEngine::new();
        assert!(engine.set_data(&data, FactorRoles::numeric(["y"]).unwrap(), "y").is_err());
    }
}
