//! Column-oriented in-memory dataset

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use super::Value;
use crate::{Error, Result};

/// A named column of homogeneous cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    /// Floating point values
    Numeric(Vec<f64>),
    /// Categorical labels
    Categorical(Vec<String>),
}

impl Column {
    /// Build a column from cells: all-numeric cells give a numeric column,
    /// anything else gives a categorical column of labels.
    #[must_use]
    pub fn from_values(values: Vec<Value>) -> Self {
        if values.iter().all(Value::is_number) {
            Self::Numeric(values.iter().filter_map(Value::as_f64).collect())
        } else {
            Self::Categorical(values.iter().map(Value::label).collect())
        }
    }

    /// Number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(values) => values.len(),
            Self::Categorical(values) => values.len(),
        }
    }

    /// Whether the column has no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cell at `index`.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<Value> {
        match self {
            Self::Numeric(values) => values.get(index).copied().map(Value::Number),
            Self::Categorical(values) => values.get(index).cloned().map(Value::Text),
        }
    }
}

/// Tabular dataset: rows × named columns.
///
/// This is the exchange format between the engine and its collaborators:
/// observed data comes in as a `Dataset`, designs go out as one.
///
/// ```
/// use scout_doe::table::Dataset;
///
/// # fn main() -> scout_doe::Result<()> {
/// let data = Dataset::new()
///     .with_numeric("pH", vec![7.0, 7.5, 8.0])?
///     .with_categorical("Buffer", ["Tris", "HEPES", "Tris"])?;
/// assert_eq!(data.num_rows(), 3);
/// assert_eq!(data.labels("pH")?, vec!["7", "7.5", "8"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    names: Vec<String>,
    columns: Vec<Column>,
    rows: usize,
}

impl Dataset {
    /// Create an empty dataset.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset from row-major cells. Column kinds are inferred per
    /// column with [`Column::from_values`].
    ///
    /// # Errors
    /// Returns error if a row length differs from the header length or a
    /// column name repeats.
    pub fn from_rows<S: AsRef<str>>(names: &[S], rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut cells: Vec<Vec<Value>> = vec![Vec::with_capacity(rows.len()); names.len()];
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != names.len() {
                return Err(Error::InvalidInput(format!(
                    "row {index} has {} cells, expected {}",
                    row.len(),
                    names.len()
                )));
            }
            for (column, value) in cells.iter_mut().zip(row) {
                column.push(value);
            }
        }

        let mut dataset = Self::new();
        for (name, values) in names.iter().zip(cells) {
            dataset.push_column(name.as_ref(), Column::from_values(values))?;
        }
        Ok(dataset)
    }

    /// Append a column.
    ///
    /// # Errors
    /// Returns error if the name is taken or the length does not match.
    pub fn push_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(Error::InvalidInput(format!("duplicate column name: {name}")));
        }
        if self.columns.is_empty() {
            self.rows = column.len();
        } else if column.len() != self.rows {
            return Err(Error::InvalidInput(format!(
                "column {name} has {} rows, dataset has {}",
                column.len(),
                self.rows
            )));
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Builder form of [`push_column`](Self::push_column) for numeric data.
    ///
    /// # Errors
    /// See [`push_column`](Self::push_column).
    pub fn with_numeric(mut self, name: impl Into<String>, values: Vec<f64>) -> Result<Self> {
        self.push_column(name, Column::Numeric(values))?;
        Ok(self)
    }

    /// Builder form of [`push_column`](Self::push_column) for labels.
    ///
    /// # Errors
    /// See [`push_column`](Self::push_column).
    pub fn with_categorical<I, S>(mut self, name: impl Into<String>, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels = values.into_iter().map(Into::into).collect();
        self.push_column(name, Column::Categorical(labels))?;
        Ok(self)
    }

    /// Number of rows.
    #[must_use]
    pub const fn num_rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Whether the dataset has no rows.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Column names in insertion order.
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Whether a column exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.position(name).map(|index| &self.columns[index])
    }

    /// Iterate `(name, column)` pairs.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    /// Fail with [`Error::ColumnNotFound`] for the first missing column.
    ///
    /// # Errors
    /// Returns error naming the first missing column.
    pub fn require_columns<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<()> {
        for name in names {
            if !self.has_column(name) {
                return Err(Error::ColumnNotFound(name.to_string()));
            }
        }
        Ok(())
    }

    /// Single cell.
    #[must_use]
    pub fn value(&self, row: usize, name: &str) -> Option<Value> {
        self.column(name).and_then(|column| column.value(row))
    }

    /// Full row in column order.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<Vec<Value>> {
        if index >= self.rows {
            return None;
        }
        self.columns.iter().map(|column| column.value(index)).collect()
    }

    /// Overwrite one cell.
    ///
    /// # Errors
    /// Returns error if the column or row does not exist, or a label is
    /// written into a numeric column.
    pub fn set_value(&mut self, row: usize, name: &str, value: Value) -> Result<()> {
        let index = self
            .position(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))?;
        if row >= self.rows {
            return Err(Error::InvalidInput(format!(
                "row {row} out of bounds (dataset has {} rows)",
                self.rows
            )));
        }
        match &mut self.columns[index] {
            Column::Numeric(values) => {
                values[row] = value.as_f64().ok_or_else(|| Error::ColumnType {
                    column: name.to_string(),
                    expected: "number",
                    detail: value.to_string(),
                })?;
            }
            Column::Categorical(values) => values[row] = value.label(),
        }
        Ok(())
    }

    /// Column values as numbers, parsing labels when needed.
    ///
    /// # Errors
    /// Returns error if the column is missing or a label is not numeric.
    pub fn numeric_values(&self, name: &str) -> Result<Cow<'_, [f64]>> {
        match self.column(name) {
            None => Err(Error::ColumnNotFound(name.to_string())),
            Some(Column::Numeric(values)) => Ok(Cow::Borrowed(values)),
            Some(Column::Categorical(labels)) => labels
                .iter()
                .map(|label| {
                    Value::parse(label).as_f64().ok_or_else(|| Error::ColumnType {
                        column: name.to_string(),
                        expected: "number",
                        detail: format!("{label:?}"),
                    })
                })
                .collect::<Result<Vec<_>>>()
                .map(Cow::Owned),
        }
    }

    /// Column values as categorical labels; numbers are formatted.
    ///
    /// # Errors
    /// Returns error if the column is missing.
    pub fn labels(&self, name: &str) -> Result<Vec<String>> {
        match self.column(name) {
            None => Err(Error::ColumnNotFound(name.to_string())),
            Some(Column::Categorical(labels)) => Ok(labels.clone()),
            Some(Column::Numeric(values)) => {
                Ok(values.iter().map(|v| Value::Number(*v).label()).collect())
            }
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_infers_kinds() {
        let data = Dataset::from_rows(
            &["Temperature", "Buffer"],
            vec![
                vec![Value::from(20.0), Value::from("Tris")],
                vec![Value::from(25.0), Value::from("HEPES")],
            ],
        )
        .unwrap();

        assert!(matches!(data.column("Temperature"), Some(Column::Numeric(_))));
        assert!(matches!(data.column("Buffer"), Some(Column::Categorical(_))));
        assert_eq!(data.row(1), Some(vec![Value::from(25.0), Value::from("HEPES")]));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let result = Dataset::new()
            .with_numeric("a", vec![1.0, 2.0])
            .and_then(|d| d.with_numeric("b", vec![1.0]));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = Dataset::new()
            .with_numeric("a", vec![1.0])
            .and_then(|d| d.with_numeric("a", vec![2.0]));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_numeric_values_parses_labels() {
        let data = Dataset::new()
            .with_categorical("pH", ["7.0", "8.5"])
            .unwrap();
        assert_eq!(data.numeric_values("pH").unwrap().as_ref(), &[7.0, 8.5]);

        let bad = Dataset::new().with_categorical("pH", ["high"]).unwrap();
        assert!(matches!(
            bad.numeric_values("pH"),
            Err(Error::ColumnType { .. })
        ));
    }

    #[test]
    fn test_set_value() {
        let mut data = Dataset::new().with_numeric("Response", vec![0.5, 0.8]).unwrap();
        data.set_value(0, "Response", Value::from(999.0)).unwrap();
        assert_eq!(data.value(0, "Response"), Some(Value::from(999.0)));
        assert!(data.set_value(5, "Response", Value::from(1.0)).is_err());
        assert!(data.set_value(0, "Response", Value::from("x")).is_err());
    }

    #[test]
    fn test_require_columns() {
        let data = Dataset::new().with_numeric("pH", vec![7.0]).unwrap();
        assert!(data.require_columns(["pH"]).is_ok());
        assert!(matches!(
            data.require_columns(["pH", "NaCl"]),
            Err(Error::ColumnNotFound(name)) if name == "NaCl"
        ));
    }
}
