//! Engine configuration
//!
//! All knobs have defaults matching the lab workflow (α = 0.05, fail on the
//! first over-capacity well, no plate layout). Configuration can be built in
//! code with [`EngineConfig::builder`] or parsed from JSON; unspecified
//! fields keep their defaults.
//!
//! ```rust
//! use scout_doe::config::{CapacityPolicy, EngineConfig};
//!
//! # fn main() -> scout_doe::Result<()> {
//! let config = EngineConfig::from_json(r#"{
//!     "significance_level": 0.1,
//!     "capacity_policy": "skip_row",
//!     "optimizer": { "seed": 42 }
//! }"#)?;
//!
//! assert_eq!(config.capacity_policy, CapacityPolicy::SkipRow);
//! assert_eq!(config.optimizer.seed, Some(42));
//! assert_eq!(config.optimizer.candidate_count, 2048);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

use crate::design::PlateFormat;
use crate::{Error, Result};

/// Default significance threshold for coefficient tests.
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.05;

/// What the design builder does with a combination whose reagents overflow
/// the well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityPolicy {
    /// Abort the whole build on the first offending combination
    #[default]
    FailFast,
    /// Drop offending combinations and report them alongside the design
    SkipRow,
}

/// Settings for the built-in Bayesian optimization backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// RNG seed for reproducible suggestions (`None` = entropy)
    pub seed: Option<u64>,
    /// Random candidates scored by expected improvement per suggestion
    pub candidate_count: usize,
    /// RBF kernel length scale in unit-scaled parameter space
    pub length_scale: f64,
    /// Observation noise variance added to the kernel diagonal
    pub noise: f64,
    /// Expected-improvement exploration margin (ξ)
    pub exploration: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            seed: None,
            candidate_count: 2048,
            length_scale: 0.25,
            noise: 1e-6,
            exploration: 0.01,
        }
    }
}

impl OptimizerConfig {
    /// Check value ranges.
    ///
    /// # Errors
    /// Returns error if any setting is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.candidate_count == 0 {
            return Err(Error::InvalidInput(
                "optimizer.candidate_count must be greater than 0".to_string(),
            ));
        }
        if !(self.length_scale.is_finite() && self.length_scale > 0.0) {
            return Err(Error::InvalidInput(format!(
                "optimizer.length_scale must be positive, got {}",
                self.length_scale
            )));
        }
        if !(self.noise.is_finite() && self.noise >= 0.0) {
            return Err(Error::InvalidInput(format!(
                "optimizer.noise must be non-negative, got {}",
                self.noise
            )));
        }
        if !(self.exploration.is_finite() && self.exploration >= 0.0) {
            return Err(Error::InvalidInput(format!(
                "optimizer.exploration must be non-negative, got {}",
                self.exploration
            )));
        }
        Ok(())
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// α used for coefficient significance flags
    pub significance_level: f64,
    /// Absolute volume slack before a negative diluent counts as overflow
    pub volume_tolerance: f64,
    /// Over-capacity handling in the design builder
    pub capacity_policy: CapacityPolicy,
    /// Plate layout for well assignment (`None` = no wells)
    pub plate_format: Option<PlateFormat>,
    /// Bayesian backend settings
    pub optimizer: OptimizerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            significance_level: DEFAULT_SIGNIFICANCE_LEVEL,
            volume_tolerance: 1e-9,
            capacity_policy: CapacityPolicy::default(),
            plate_format: None,
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration builder
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    /// Returns error if the JSON is malformed or a value is out of range.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check value ranges.
    ///
    /// # Errors
    /// Returns error if any setting is out of range.
    pub fn validate(&self) -> Result<()> {
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(Error::InvalidInput(format!(
                "significance_level must be in (0, 1), got {}",
                self.significance_level
            )));
        }
        if !(self.volume_tolerance.is_finite() && self.volume_tolerance >= 0.0) {
            return Err(Error::InvalidInput(format!(
                "volume_tolerance must be non-negative, got {}",
                self.volume_tolerance
            )));
        }
        self.optimizer.validate()
    }
}

/// Builder for [`EngineConfig`]
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set the coefficient significance threshold
    #[must_use]
    pub const fn significance_level(mut self, alpha: f64) -> Self {
        self.config.significance_level = alpha;
        self
    }

    /// Set the volume tolerance
    #[must_use]
    pub const fn volume_tolerance(mut self, tolerance: f64) -> Self {
        self.config.volume_tolerance = tolerance;
        self
    }

    /// Set the over-capacity policy
    #[must_use]
    pub const fn capacity_policy(mut self, policy: CapacityPolicy) -> Self {
        self.config.capacity_policy = policy;
        self
    }

    /// Assign wells on plates of the given format
    #[must_use]
    pub const fn plate_format(mut self, format: PlateFormat) -> Self {
        self.config.plate_format = Some(format);
        self
    }

    /// Fix the optimizer RNG seed
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.config.optimizer.seed = Some(seed);
        self
    }

    /// Replace the optimizer settings
    #[must_use]
    pub fn optimizer(mut self, optimizer: OptimizerConfig) -> Self {
        self.config.optimizer = optimizer;
        self
    }

    /// Validate and build the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any setting is out of range
    pub fn build(self) -> Result<EngineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
