//! Full-factorial design generation with pipetting volumes
//!
//! [`ExperimentDesignBuilder`] enumerates every combination of factor levels
//! (last factor varies fastest) and computes, for each stocked factor, the
//! volume of stock that reaches the target concentration in the final well
//! volume:
//!
//! ```text
//! volume = level / stock × final_volume
//! diluent = final_volume − Σ volumes
//! ```
//!
//! A combination whose reagents alone exceed the final volume is never
//! clamped. Depending on [`CapacityPolicy`] the build either fails with
//! [`Error::Capacity`] or drops the row and reports it in
//! [`Design::rejected`].
//!
//! # Example
//!
//! ```rust
//! use scout_doe::design::ExperimentDesignBuilder;
//! use scout_doe::project::{Factor, FactorSet};
//!
//! # fn main() -> scout_doe::Result<()> {
//! let mut factors = FactorSet::new();
//! factors.add(Factor::numeric("pH", [7.0, 7.5, 8.0])?)?;
//! factors.add(Factor::numeric("NaCl", [100.0, 150.0, 200.0])?.with_stock(1000.0)?)?;
//!
//! let design = ExperimentDesignBuilder::new(100.0)?.build(&factors)?;
//! assert_eq!(design.matrix.len(), 9);
//!
//! let row = &design.matrix.rows()[4]; // pH 7.5, NaCl 150
//! assert!((row.reagent_volumes[0] - 15.0).abs() < 1e-9);
//! assert!((row.diluent_volume - 85.0).abs() < 1e-9);
//! # Ok(())
//! # }
//! ```

mod matrix;
mod plate;

pub use matrix::{
    volume_column, ExperimentMatrix, ExperimentRow, VolumeMatrix, VolumeRow, DILUENT_COLUMN,
    DILUENT_VOLUME_COLUMN, ID_COLUMN, PLATE_COLUMN, TOTAL_VOLUME_COLUMN, WELL_COLUMN,
};
pub use plate::{PlateFormat, WellPosition};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::config::{CapacityPolicy, EngineConfig};
use crate::project::FactorSet;
use crate::roles::FactorRole;
use crate::table::Value;
use crate::{Error, Result};

/// A combination dropped under [`CapacityPolicy::SkipRow`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityViolation {
    /// 1-based combination index
    pub row: usize,
    /// Levels of the combination, in factor order
    pub levels: Vec<Value>,
    /// Sum of reagent volumes
    pub required: f64,
    /// Final volume it had to fit in
    pub final_volume: f64,
}

/// Output of a design build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
    /// Levels and volumes per row
    pub matrix: ExperimentMatrix,
    /// Pipetting table with the same rows
    pub volumes: VolumeMatrix,
    /// Rows dropped for exceeding capacity
    pub rejected: Vec<CapacityViolation>,
}

/// Generates full-factorial designs for a fixed final well volume.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentDesignBuilder {
    final_volume: f64,
    capacity_policy: CapacityPolicy,
    tolerance: f64,
    plate_format: Option<PlateFormat>,
}

struct Reagent<'a> {
    index: usize,
    name: &'a str,
    stock: f64,
}

impl ExperimentDesignBuilder {
    /// Create a builder with default policy (fail fast, no plate layout).
    ///
    /// # Errors
    /// Returns error if `final_volume` is not a positive finite number.
    pub fn new(final_volume: f64) -> Result<Self> {
        if !(final_volume.is_finite() && final_volume > 0.0) {
            return Err(Error::InvalidInput(format!(
                "final volume must be positive, got {final_volume}"
            )));
        }
        let defaults = EngineConfig::default();
        Ok(Self {
            final_volume,
            capacity_policy: defaults.capacity_policy,
            tolerance: defaults.volume_tolerance,
            plate_format: defaults.plate_format,
        })
    }

    /// Create a builder taking policy, tolerance and plate format from `config`.
    ///
    /// # Errors
    /// Returns error if `final_volume` is invalid.
    pub fn from_config(final_volume: f64, config: &EngineConfig) -> Result<Self> {
        let mut builder = Self::new(final_volume)?;
        builder.capacity_policy = config.capacity_policy;
        builder.tolerance = config.volume_tolerance;
        builder.plate_format = config.plate_format;
        Ok(builder)
    }

    /// Set the over-capacity policy.
    #[must_use]
    pub const fn capacity_policy(mut self, policy: CapacityPolicy) -> Self {
        self.capacity_policy = policy;
        self
    }

    /// Set the absolute slack below zero tolerated for the diluent.
    #[must_use]
    pub const fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Assign wells on plates of `format`.
    #[must_use]
    pub const fn plate_format(mut self, format: PlateFormat) -> Self {
        self.plate_format = Some(format);
        self
    }

    /// Final volume per well.
    #[must_use]
    pub const fn final_volume(&self) -> f64 {
        self.final_volume
    }

    /// Build using the stock concentrations stored on the factors.
    ///
    /// # Errors
    /// See [`build_with_stocks`](Self::build_with_stocks).
    pub fn build(&self, factors: &FactorSet) -> Result<Design> {
        self.build_with_stocks(factors, &factors.stock_concentrations())
    }

    /// Build using an explicit stock map. Factors without a stock contribute
    /// no volume.
    ///
    /// # Errors
    /// Returns error if:
    /// - the factor set is empty
    /// - a stock names an unknown or categorical factor, or is not positive
    /// - a stocked factor has a negative level
    /// - a combination overflows and the policy is [`CapacityPolicy::FailFast`]
    pub fn build_with_stocks(
        &self,
        factors: &FactorSet,
        stocks: &BTreeMap<String, f64>,
    ) -> Result<Design> {
        if factors.is_empty() {
            return Err(Error::InvalidInput(
                "cannot build a design without factors".to_string(),
            ));
        }
        let reagents = Self::reagents(factors, stocks)?;
        let factor_names: Vec<String> = factors.names().map(str::to_string).collect();
        let reagent_names: Vec<String> = reagents.iter().map(|r| r.name.to_string()).collect();

        debug!(
            factors = factor_names.len(),
            reagents = reagent_names.len(),
            combinations = factors.combination_count(),
            "enumerating design"
        );

        let mut rows = Vec::new();
        let mut rejected = Vec::new();

        let combinations = factors
            .iter()
            .map(|factor| factor.levels().iter())
            .multi_cartesian_product();

        for (offset, combination) in combinations.enumerate() {
            let id = offset + 1;
            let levels: Vec<Value> = combination.into_iter().cloned().collect();
            let reagent_volumes: Vec<f64> = reagents
                .iter()
                .map(|r| {
                    let level = levels[r.index].as_f64().unwrap_or(0.0);
                    level / r.stock * self.final_volume
                })
                .collect();
            let required: f64 = reagent_volumes.iter().sum();
            let residual = self.final_volume - required;

            if residual < -self.tolerance {
                match self.capacity_policy {
                    CapacityPolicy::FailFast => {
                        return Err(Error::Capacity {
                            row: id,
                            required,
                            final_volume: self.final_volume,
                        });
                    }
                    CapacityPolicy::SkipRow => {
                        warn!(
                            row = id,
                            required,
                            final_volume = self.final_volume,
                            "skipping over-capacity combination"
                        );
                        rejected.push(CapacityViolation {
                            row: id,
                            levels,
                            required,
                            final_volume: self.final_volume,
                        });
                        continue;
                    }
                }
            }

            let well = self.plate_format.map(|format| format.well(rows.len()));
            rows.push(ExperimentRow {
                id,
                well,
                levels,
                reagent_volumes,
                diluent_volume: residual.max(0.0),
            });
        }

        info!(rows = rows.len(), rejected = rejected.len(), "design generated");

        let matrix = ExperimentMatrix::new(factor_names, reagent_names, self.final_volume, rows);
        let volumes = matrix.volume_matrix();
        Ok(Design {
            matrix,
            volumes,
            rejected,
        })
    }

    fn reagents<'a>(
        factors: &'a FactorSet,
        stocks: &BTreeMap<String, f64>,
    ) -> Result<Vec<Reagent<'a>>> {
        for (name, &stock) in stocks {
            let factor = factors
                .get(name)
                .ok_or_else(|| Error::UnknownFactor(name.clone()))?;
            if factor.role() == FactorRole::Categorical {
                return Err(Error::InvalidInput(format!(
                    "factor {name} is categorical and cannot have a stock concentration"
                )));
            }
            if !(stock.is_finite() && stock > 0.0) {
                return Err(Error::InvalidInput(format!(
                    "stock concentration for {name} must be positive, got {stock}"
                )));
            }
        }

        let mut reagents = Vec::new();
        for (index, factor) in factors.iter().enumerate() {
            let Some(&stock) = stocks.get(factor.name()) else {
                continue;
            };
            if let Some(level) = factor
                .levels()
                .iter()
                .find(|level| level.as_f64().map_or(true, |v| v < 0.0))
            {
                return Err(Error::InvalidInput(format!(
                    "factor {} has level {level}; stocked levels must be non-negative",
                    factor.name()
                )));
            }
            reagents.push(Reagent {
                index,
                name: factor.name(),
                stock,
            });
        }
        Ok(reagents)
    }
}
