//! Factor definitions for a screening project
//!
//! A [`FactorSet`] is the ordered list of factors a design is generated
//! from. Insertion order is the column order of every derived table and the
//! nesting order of the factorial enumeration.
//!
//! ```rust
//! use scout_doe::project::{Factor, FactorSet};
//!
//! # fn main() -> scout_doe::Result<()> {
//! let mut factors = FactorSet::new();
//! factors.add(Factor::numeric("pH", [7.0, 7.5, 8.0])?)?;
//! factors.add(Factor::numeric("NaCl", [100.0, 150.0, 200.0])?.with_stock(1000.0)?)?;
//!
//! assert_eq!(factors.combination_count(), 9);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog;
use crate::roles::{FactorRole, FactorRoles};
use crate::table::Value;
use crate::{Error, Result};

/// One experimental variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    name: String,
    role: FactorRole,
    levels: Vec<Value>,
    stock_concentration: Option<f64>,
}

impl Factor {
    /// Create a factor.
    ///
    /// # Errors
    /// Returns error if:
    /// - there are no levels, or a level repeats
    /// - a numeric factor has a non-numeric level
    /// - the stock is not a positive finite number, or is set on a
    ///   categorical factor
    pub fn new(
        name: impl Into<String>,
        role: FactorRole,
        levels: Vec<Value>,
        stock_concentration: Option<f64>,
    ) -> Result<Self> {
        let name = name.into();
        let levels = validate_levels(&name, role, levels)?;
        validate_stock(&name, role, stock_concentration)?;
        Ok(Self {
            name,
            role,
            levels,
            stock_concentration,
        })
    }

    /// Numeric factor without a stock.
    ///
    /// # Errors
    /// See [`Factor::new`].
    pub fn numeric(name: impl Into<String>, levels: impl IntoIterator<Item = f64>) -> Result<Self> {
        Self::new(
            name,
            FactorRole::Numeric,
            levels.into_iter().map(Value::Number).collect(),
            None,
        )
    }

    /// Categorical factor.
    ///
    /// # Errors
    /// See [`Factor::new`].
    pub fn categorical<I, S>(name: impl Into<String>, levels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            FactorRole::Categorical,
            levels.into_iter().map(|l| Value::Text(l.into())).collect(),
            None,
        )
    }

    /// Attach a stock concentration.
    ///
    /// # Errors
    /// Returns error if the stock is invalid for this factor.
    pub fn with_stock(mut self, stock_concentration: f64) -> Result<Self> {
        validate_stock(&self.name, self.role, Some(stock_concentration))?;
        self.stock_concentration = Some(stock_concentration);
        Ok(self)
    }

    /// Factor name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared role.
    #[must_use]
    pub const fn role(&self) -> FactorRole {
        self.role
    }

    /// Levels in entry order.
    #[must_use]
    pub fn levels(&self) -> &[Value] {
        &self.levels
    }

    /// Stock concentration, if the factor is a diluted reagent.
    #[must_use]
    pub const fn stock_concentration(&self) -> Option<f64> {
        self.stock_concentration
    }

    /// Number of levels.
    #[must_use]
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}

fn validate_levels(name: &str, role: FactorRole, levels: Vec<Value>) -> Result<Vec<Value>> {
    if levels.is_empty() {
        return Err(Error::InvalidInput(format!(
            "factor {name} needs at least one level"
        )));
    }

    let levels = match role {
        FactorRole::Numeric => levels
            .into_iter()
            .map(|level| {
                level.as_f64().map(Value::Number).ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "factor {name} is numeric but level {level:?} is not a number"
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?,
        FactorRole::Categorical => levels
            .into_iter()
            .map(|level| Value::Text(level.label()))
            .collect(),
    };

    for (i, level) in levels.iter().enumerate() {
        if levels[..i].contains(level) {
            return Err(Error::InvalidInput(format!(
                "factor {name} lists level {level} more than once"
            )));
        }
    }
    Ok(levels)
}

fn validate_stock(name: &str, role: FactorRole, stock: Option<f64>) -> Result<()> {
    match (role, stock) {
        (_, None) => Ok(()),
        (FactorRole::Categorical, Some(_)) => Err(Error::InvalidInput(format!(
            "factor {name} is categorical and cannot have a stock concentration"
        ))),
        (FactorRole::Numeric, Some(stock)) if stock.is_finite() && stock > 0.0 => Ok(()),
        (FactorRole::Numeric, Some(stock)) => Err(Error::InvalidInput(format!(
            "stock concentration for {name} must be positive, got {stock}"
        ))),
    }
}

/// Parse comma-separated level text as typed into a factor dialog.
///
/// Empty entries are skipped; each entry is parsed with [`Value::parse`].
#[must_use]
pub fn parse_levels(text: &str) -> Vec<Value> {
    entries(text).map(Value::parse).collect()
}

fn entries(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|entry| !entry.is_empty())
}

/// Ordered, name-unique collection of factors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactorSet {
    factors: Vec<Factor>,
}

impl FactorSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a factor.
    ///
    /// # Errors
    /// Returns error if a factor with the same name exists.
    pub fn add(&mut self, factor: Factor) -> Result<()> {
        if self.contains(factor.name()) {
            return Err(Error::InvalidInput(format!(
                "factor {} already exists",
                factor.name()
            )));
        }
        self.factors.push(factor);
        Ok(())
    }

    /// Add a catalog factor from dialog input: comma-separated levels and an
    /// optional stock. The role comes from the catalog; unknown keys are
    /// numeric.
    ///
    /// # Errors
    /// Returns error if the levels or stock are invalid or the name exists.
    pub fn add_from_catalog(&mut self, key: &str, levels: &str, stock: Option<f64>) -> Result<()> {
        let role = catalog::role_of(key).unwrap_or(FactorRole::Numeric);
        let levels = match role {
            // Labels keep their spelling ("7.0" stays "7.0")
            FactorRole::Categorical => entries(levels).map(Value::from).collect(),
            FactorRole::Numeric => parse_levels(levels),
        };
        self.add(Factor::new(key, role, levels, stock)?)
    }

    /// Replace the levels and stock of an existing factor, keeping its
    /// position and role.
    ///
    /// # Errors
    /// Returns error if the factor does not exist or the new values are invalid.
    pub fn update(&mut self, name: &str, levels: Vec<Value>, stock: Option<f64>) -> Result<()> {
        let index = self
            .position(name)
            .ok_or_else(|| Error::UnknownFactor(name.to_string()))?;
        let role = self.factors[index].role;
        self.factors[index] = Factor::new(name, role, levels, stock)?;
        Ok(())
    }

    /// Remove a factor. Designs generated earlier no longer match the set.
    ///
    /// # Errors
    /// Returns error if the factor does not exist.
    pub fn remove(&mut self, name: &str) -> Result<Factor> {
        let index = self
            .position(name)
            .ok_or_else(|| Error::UnknownFactor(name.to_string()))?;
        Ok(self.factors.remove(index))
    }

    /// Factor by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Factor> {
        self.factors.iter().find(|f| f.name == name)
    }

    /// Whether a factor exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Factors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Factor> {
        self.factors.iter()
    }

    /// Factor names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factors.iter().map(Factor::name)
    }

    /// Number of factors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    /// Number of full-factorial combinations (saturates at `usize::MAX`).
    #[must_use]
    pub fn combination_count(&self) -> usize {
        if self.factors.is_empty() {
            return 0;
        }
        self.factors
            .iter()
            .fold(1usize, |total, f| total.saturating_mul(f.level_count()))
    }

    /// Stock concentrations of the factors that have one.
    #[must_use]
    pub fn stock_concentrations(&self) -> BTreeMap<String, f64> {
        self.factors
            .iter()
            .filter_map(|f| f.stock_concentration.map(|stock| (f.name.clone(), stock)))
            .collect()
    }

    /// Role declaration matching this set, for analysis and optimization.
    ///
    /// # Errors
    /// Returns error if the set is empty.
    pub fn roles(&self) -> Result<FactorRoles> {
        FactorRoles::from_pairs(self.factors.iter().map(|f| (f.name.clone(), f.role)))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.factors.iter().position(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factor_requires_levels() {
        let result = Factor::numeric("pH", []);
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_numeric_factor_rejects_labels() {
        let result = Factor::new("NaCl", FactorRole::Numeric, vec![Value::from("lots")], None);
        assert!(result.is_err());
    }

    #[test]
    fn test_numeric_text_levels_are_parsed() {
        let factor =
            Factor::new("NaCl", FactorRole::Numeric, vec![Value::from("150")], None).unwrap();
        assert_eq!(factor.levels(), &[Value::Number(150.0)]);
    }

    #[test]
    fn test_duplicate_levels_rejected() {
        assert!(Factor::numeric("pH", [7.0, 7.0]).is_err());
        assert!(Factor::categorical("Buffer", ["Tris", "Tris"]).is_err());
    }

    #[test]
    fn test_stock_validation() {
        let factor = Factor::numeric("NaCl", [100.0]).unwrap();
        assert!(factor.clone().with_stock(0.0).is_err());
        assert!(factor.clone().with_stock(f64::NAN).is_err());
        assert!(factor.with_stock(1000.0).is_ok());

        let buffer = Factor::categorical("Buffer", ["Tris"]).unwrap();
        assert!(buffer.with_stock(100.0).is_err());
    }

    #[test]
    fn test_add_update_remove() {
        let mut set = FactorSet::new();
        set.add(Factor::numeric("pH", [7.0, 8.0]).unwrap()).unwrap();
        set.add(Factor::numeric("NaCl", [100.0]).unwrap()).unwrap();
        assert!(set.add(Factor::numeric("pH", [6.0]).unwrap()).is_err());

        set.update("NaCl", vec![Value::from(50.0), Value::from(75.0)], Some(500.0))
            .unwrap();
        assert_eq!(set.combination_count(), 4);
        assert_eq!(set.stock_concentrations().get("NaCl"), Some(&500.0));

        let removed = set.remove("pH").unwrap();
        assert_eq!(removed.name(), "pH");
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["NaCl"]);
        assert!(matches!(set.remove("pH"), Err(Error::UnknownFactor(_))));
    }

    #[test]
    fn test_add_from_catalog_uses_catalog_role() {
        let mut set = FactorSet::new();
        set.add_from_catalog("buffer pH", "7.0, 7.5, 8.0", None).unwrap();
        set.add_from_catalog("nacl", "100, 150,200", Some(5000.0)).unwrap();

        let ph = set.get("buffer pH").unwrap();
        assert_eq!(ph.role(), FactorRole::Categorical);
        assert_eq!(ph.levels()[0], Value::from("7.0"));
        assert_eq!(ph.levels()[1], Value::from("7.5"));

        let nacl = set.get("nacl").unwrap();
        assert_eq!(nacl.role(), FactorRole::Numeric);
        assert_eq!(nacl.levels()[2], Value::Number(200.0));
    }

    #[test]
    fn test_parse_levels_skips_blanks() {
        assert_eq!(
            parse_levels(" 1, ,2 ,Tris"),
            vec![Value::from(1.0), Value::from(2.0), Value::from("Tris")]
        );
    }

    #[test]
    fn test_empty_set_has_no_combinations() {
        assert_eq!(FactorSet::new().combination_count(), 0);
        assert!(FactorSet::new().roles().is_err());
    }
}
