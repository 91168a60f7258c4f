//! Per-level response summaries (main effects)

use itertools::Itertools;
use serde::Serialize;

use crate::roles::{FactorRole, FactorRoles};
use crate::table::{Dataset, Value};
use crate::Result;

/// Response summary for one level of one factor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelEffect {
    /// Factor level
    pub level: Value,
    /// Mean response
    pub mean: f64,
    /// Sample standard deviation (`NaN` for a single observation)
    pub std_dev: f64,
    /// Number of observations
    pub count: usize,
}

/// Level summaries of one factor, levels sorted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MainEffect {
    /// Factor name
    pub factor: String,
    /// One entry per level
    pub levels: Vec<LevelEffect>,
}

impl MainEffect {
    /// Largest minus smallest level mean.
    #[must_use]
    pub fn range(&self) -> f64 {
        let (min, max) = self
            .levels
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), l| {
                (lo.min(l.mean), hi.max(l.mean))
            });
        if self.levels.is_empty() {
            f64::NAN
        } else {
            max - min
        }
    }
}

/// Group `response` by each factor and summarize. Rows with a non-finite
/// response or a non-finite numeric factor value are skipped.
///
/// # Errors
/// Returns error if a column is missing or the response is not numeric.
#[allow(clippy::cast_precision_loss)]
pub fn main_effects(
    data: &Dataset,
    roles: &FactorRoles,
    response: &str,
) -> Result<Vec<MainEffect>> {
    let y = data.numeric_values(response)?;
    roles
        .iter()
        .map(|(factor, role)| -> Result<MainEffect> {
            let levels: Vec<Value> = match role {
                FactorRole::Numeric => data
                    .numeric_values(factor)?
                    .iter()
                    .map(|v| Value::Number(*v))
                    .collect(),
                FactorRole::Categorical => {
                    data.labels(factor)?.into_iter().map(Value::Text).collect()
                }
            };

            let mut pairs: Vec<(Value, f64)> = levels
                .into_iter()
                .zip(y.iter().copied())
                .filter(|(level, y)| {
                    y.is_finite() && !matches!(level, Value::Number(n) if !n.is_finite())
                })
                .collect();
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

            let summaries = pairs
                .into_iter()
                .chunk_by(|(level, _)| level.clone())
                .into_iter()
                .map(|(level, group)| {
                    let values: Vec<f64> = group.map(|(_, y)| y).collect();
                    let count = values.len();
                    let mean = values.iter().sum::<f64>() / count as f64;
                    let std_dev = if count > 1 {
                        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
                        (ss / (count - 1) as f64).sqrt()
                    } else {
                        f64::NAN
                    };
                    LevelEffect {
                        level,
                        mean,
                        std_dev,
                        count,
                    }
                })
                .collect();

            Ok(MainEffect {
                factor: factor.to_string(),
                levels: summaries,
            })
        })
        .collect()
}
