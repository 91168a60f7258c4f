//! Search-space bounds inferred from observed data

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::roles::{FactorRole, FactorRoles};
use crate::table::{Dataset, Value};
use crate::Result;

/// Admissible values of one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ParameterBounds {
    /// Closed interval; `lower == upper` when only one value was observed
    Range {
        /// Smallest observed value
        lower: f64,
        /// Largest observed value
        upper: f64,
    },
    /// Distinct labels in first-seen order
    Choice {
        /// Allowed labels
        values: Vec<String>,
    },
}

impl ParameterBounds {
    /// Whether `value` lies within the bounds.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        match self {
            Self::Range { lower, upper } => value
                .as_f64()
                .is_some_and(|v| v >= *lower && v <= *upper),
            Self::Choice { values } => values.iter().any(|c| *c == value.label()),
        }
    }

    /// Whether the range collapses to a single point or the choice to a
    /// single label.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_degenerate(&self) -> bool {
        match self {
            Self::Range { lower, upper } => lower == upper,
            Self::Choice { values } => values.len() == 1,
        }
    }
}

/// Bounds for every factor that has at least one usable value. Factors
/// with none (empty dataset, all `NaN`) are absent from the map.
///
/// # Errors
/// Returns error if a factor column is missing or a numeric factor holds
/// non-numeric labels.
pub fn compute_bounds(
    data: &Dataset,
    roles: &FactorRoles,
) -> Result<BTreeMap<String, ParameterBounds>> {
    let mut bounds = BTreeMap::new();
    for (factor, role) in roles.iter() {
        let entry = match role {
            FactorRole::Numeric => {
                let values = data.numeric_values(factor)?;
                values
                    .iter()
                    .filter(|v| !v.is_nan())
                    .fold(None, |acc: Option<(f64, f64)>, &v| {
                        Some(acc.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v))))
                    })
                    .map(|(lower, upper)| ParameterBounds::Range { lower, upper })
            }
            FactorRole::Categorical => {
                let mut values: Vec<String> = Vec::new();
                for label in data.labels(factor)? {
                    if !values.contains(&label) {
                        values.push(label);
                    }
                }
                (!values.is_empty()).then_some(ParameterBounds::Choice { values })
            }
        };
        match entry {
            Some(entry) => {
                debug!(factor, bounds = ?entry, "inferred bounds");
                bounds.insert(factor.to_string(), entry);
            }
            None => debug!(factor, "no observed values; bounds omitted"),
        }
    }
    Ok(bounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_and_categorical_bounds() {
        let data = Dataset::new()
            .with_numeric("NaCl", vec![150.0, f64::NAN, 50.0, 300.0])
            .unwrap()
            .with_categorical("Buffer", ["Tris", "HEPES", "Tris", "MES"])
            .unwrap();
        let roles = FactorRoles::new(&["NaCl", "Buffer"], &["Buffer"], &[]).unwrap();
        let bounds = compute_bounds(&data, &roles).unwrap();

        assert_eq!(bounds["NaCl"], ParameterBounds::Range { lower: 50.0, upper: 300.0 });
        assert_eq!(
            bounds["Buffer"],
            ParameterBounds::Choice {
                values: vec!["Tris".into(), "HEPES".into(), "MES".into()]
            }
        );
    }

    #[test]
    fn test_single_value_is_degenerate_range() {
        let data = Dataset::new().with_numeric("pH", vec![7.0, 7.0]).unwrap();
        let bounds = compute_bounds(&data, &FactorRoles::numeric(["pH"]).unwrap()).unwrap();
        assert!(bounds["pH"].is_degenerate());
    }

    #[test]
    fn test_empty_dataset_has_no_bounds() {
        let data = Dataset::new()
            .with_numeric("pH", vec![])
            .unwrap()
            .with_categorical("Buffer", Vec::<String>::new())
            .unwrap();
        let roles = FactorRoles::new(&["pH", "Buffer"], &["Buffer"], &["pH"]).unwrap();
        assert!(compute_bounds(&data, &roles).unwrap().is_empty());
    }

    #[test]
    fn test_contains() {
        let range = ParameterBounds::Range { lower: 1.0, upper: 2.0 };
        assert!(range.contains(&Value::from(1.5)));
        assert!(!range.contains(&Value::from(2.5)));
        let choice = ParameterBounds::Choice { values: vec!["7.5".into()] };
        assert!(choice.contains(&Value::from(7.5)));
    }
}
