//! Factor role declarations
//!
//! The engine never infers whether a column is categorical from its
//! content. The caller declares roles once and the same declaration drives
//! formula synthesis, encoding and bounds inference.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// How a factor enters models and search spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorRole {
    /// Discrete labels, indicator-coded in regressions
    Categorical,
    /// Continuous values
    Numeric,
}

/// Ordered factor columns with their declared roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorRoles {
    factors: Vec<(String, FactorRole)>,
}

impl FactorRoles {
    /// Declare roles for `factor_columns`.
    ///
    /// A factor listed in neither `categorical` nor `numeric` is numeric.
    ///
    /// ```
    /// use scout_doe::roles::{FactorRole, FactorRoles};
    ///
    /// # fn main() -> scout_doe::Result<()> {
    /// let roles = FactorRoles::new(&["Temperature", "Buffer"], &["Buffer"], &["Temperature"])?;
    /// assert_eq!(roles.role("Buffer"), Some(FactorRole::Categorical));
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// Returns error if there are no factors, a factor repeats, a declared
    /// name is not a factor column, or a factor is declared both ways.
    pub fn new<S: AsRef<str>>(
        factor_columns: &[S],
        categorical: &[S],
        numeric: &[S],
    ) -> Result<Self> {
        let contains = |list: &[S], name: &str| list.iter().any(|s| s.as_ref() == name);

        for declared in categorical.iter().chain(numeric) {
            if !contains(factor_columns, declared.as_ref()) {
                return Err(Error::InvalidInput(format!(
                    "factor {:?} has a declared role but is not a factor column",
                    declared.as_ref()
                )));
            }
        }

        let mut pairs = Vec::with_capacity(factor_columns.len());
        for name in factor_columns {
            let name = name.as_ref();
            let role = match (contains(categorical, name), contains(numeric, name)) {
                (true, true) => {
                    return Err(Error::InvalidInput(format!(
                        "factor {name:?} is declared both categorical and numeric"
                    )));
                }
                (true, false) => FactorRole::Categorical,
                (false, _) => FactorRole::Numeric,
            };
            pairs.push((name, role));
        }
        Self::from_pairs(pairs)
    }

    /// Declare roles from `(name, role)` pairs.
    ///
    /// # Errors
    /// Returns error if there are no factors or a name repeats.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, FactorRole)>,
        S: Into<String>,
    {
        let mut factors: Vec<(String, FactorRole)> = Vec::new();
        for (name, role) in pairs {
            let name = name.into();
            if factors.iter().any(|(existing, _)| *existing == name) {
                return Err(Error::InvalidInput(format!("duplicate factor column: {name}")));
            }
            factors.push((name, role));
        }
        if factors.is_empty() {
            return Err(Error::InvalidInput(
                "at least one factor column is required".to_string(),
            ));
        }
        Ok(Self { factors })
    }

    /// All factors numeric.
    ///
    /// # Errors
    /// See [`from_pairs`](Self::from_pairs).
    pub fn numeric<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Result<Self> {
        Self::from_pairs(names.into_iter().map(|name| (name, FactorRole::Numeric)))
    }

    /// Role of `name`, if it is a factor.
    #[must_use]
    pub fn role(&self, name: &str) -> Option<FactorRole> {
        self.factors
            .iter()
            .find_map(|(factor, role)| (factor == name).then_some(*role))
    }

    /// Iterate `(name, role)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, FactorRole)> {
        self.factors.iter().map(|(name, role)| (name.as_str(), *role))
    }

    /// Factor names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factors.iter().map(|(name, _)| name.as_str())
    }

    /// Names of categorical factors.
    #[must_use]
    pub fn categorical(&self) -> Vec<&str> {
        self.with_role(FactorRole::Categorical)
    }

    /// Names of numeric factors.
    #[must_use]
    pub fn numeric_factors(&self) -> Vec<&str> {
        self.with_role(FactorRole::Numeric)
    }

    /// Number of factors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    /// Always false for a validated declaration.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    fn with_role(&self, wanted: FactorRole) -> Vec<&str> {
        self.iter()
            .filter(|(_, role)| *role == wanted)
            .map(|(name, _)| name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_undeclared_factor_is_numeric() {
        let roles = FactorRoles::new(&["pH", "NaCl"], &[], &["pH"]).unwrap();
        assert_eq!(roles.role("NaCl"), Some(FactorRole::Numeric));
        assert_eq!(roles.numeric_factors(), vec!["pH", "NaCl"]);
        assert!(roles.categorical().is_empty());
    }

    #[test]
    fn test_declared_both_ways_rejected() {
        let result = FactorRoles::new(&["pH"], &["pH"], &["pH"]);
        assert!(matches!(result, Err(Error::InvalidInput(msg)) if msg.contains("both")));
    }

    #[test]
    fn test_declared_non_factor_rejected() {
        let result = FactorRoles::new(&["pH"], &["Buffer"], &[]);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_duplicates_and_empty_rejected() {
        assert!(FactorRoles::new(&["pH", "pH"], &[], &[]).is_err());
        assert!(FactorRoles::numeric(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_order_preserved() {
        let roles = FactorRoles::new(&["b", "a", "c"], &["a"], &[]).unwrap();
        assert_eq!(roles.names().collect::<Vec<_>>(), vec!["b", "a", "c"]);
    }
}
