//! Design-matrix encoding with treatment-coded categoricals

use nalgebra::DMatrix;
use rustc_hash::FxHashMap;

use super::terms::{factor_label, quote, Term, TermSet, INTERCEPT};
use crate::roles::FactorRole;
use crate::table::{Dataset, Value};
use crate::{Error, Result};

#[derive(Debug, Clone)]
enum Part {
    Numeric(String),
    Square(String),
    Indicator { factor: String, level: String },
}

#[derive(Debug, Clone)]
struct EncodedColumn {
    name: String,
    parts: Vec<Part>,
}

enum FactorData {
    Numeric(Vec<f64>),
    Labels(Vec<String>),
}

/// Maps dataset rows to design-matrix rows. Built once from the fitting
/// data so that prediction reuses the same reference levels.
#[derive(Debug, Clone)]
pub(crate) struct DesignEncoder {
    columns: Vec<EncodedColumn>,
    levels: FxHashMap<String, Vec<String>>,
}

/// Distinct labels, numbers first in numeric order, then text. Labels are
/// compared exactly, so "7" and "7.0" remain separate levels.
pub(crate) fn sorted_levels(labels: &[String]) -> Vec<String> {
    let mut levels: Vec<String> = labels.to_vec();
    levels.sort_by(|a, b| {
        Value::parse(a)
            .total_cmp(&Value::parse(b))
            .then_with(|| a.cmp(b))
    });
    levels.dedup();
    levels
}

impl DesignEncoder {
    pub(crate) fn new(terms: &TermSet, data: &Dataset) -> Result<Self> {
        let roles = terms.roles();
        let mut levels = FxHashMap::default();
        for name in roles.categorical() {
            levels.insert(name.to_string(), sorted_levels(&data.labels(name)?));
        }

        let main_columns = |factor: &str| -> Vec<EncodedColumn> {
            match roles.role(factor).unwrap_or(FactorRole::Numeric) {
                FactorRole::Numeric => vec![EncodedColumn {
                    name: quote(factor),
                    parts: vec![Part::Numeric(factor.to_string())],
                }],
                FactorRole::Categorical => levels
                    .get(factor)
                    .map(|lv: &Vec<String>| lv.iter().skip(1).collect::<Vec<_>>())
                    .unwrap_or_default()
                    .into_iter()
                    .map(|level| EncodedColumn {
                        name: format!(
                            "{}[T.{level}]",
                            factor_label(factor, FactorRole::Categorical)
                        ),
                        parts: vec![Part::Indicator {
                            factor: factor.to_string(),
                            level: level.clone(),
                        }],
                    })
                    .collect(),
            }
        };

        let mut columns = vec![EncodedColumn {
            name: INTERCEPT.to_string(),
            parts: Vec::new(),
        }];
        for term in terms.terms() {
            match term {
                Term::Main(factor) => columns.extend(main_columns(factor)),
                Term::Interaction(a, b) => {
                    let right = main_columns(b);
                    for left in main_columns(a) {
                        for r in &right {
                            let mut parts = left.parts.clone();
                            parts.extend(r.parts.iter().cloned());
                            columns.push(EncodedColumn {
                                name: format!("{}:{}", left.name, r.name),
                                parts,
                            });
                        }
                    }
                }
                Term::Squared(factor) => columns.push(EncodedColumn {
                    name: format!("I({} ** 2)", quote(factor)),
                    parts: vec![Part::Square(factor.clone())],
                }),
            }
        }

        Ok(Self { columns, levels })
    }

    /// Coefficient names, intercept first.
    pub(crate) fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub(crate) fn width(&self) -> usize {
        self.columns.len()
    }

    /// Encode `data`. Categorical labels outside the fitted levels and
    /// non-finite numeric cells are rejected.
    pub(crate) fn encode(&self, data: &Dataset) -> Result<DMatrix<f64>> {
        let mut cache: FxHashMap<&str, FactorData> = FxHashMap::default();
        for column in &self.columns {
            for part in &column.parts {
                let (factor, categorical) = match part {
                    Part::Numeric(f) | Part::Square(f) => (f.as_str(), false),
                    Part::Indicator { factor, .. } => (factor.as_str(), true),
                };
                if cache.contains_key(factor) {
                    continue;
                }
                let values = if categorical {
                    let labels = data.labels(factor)?;
                    let known = self.levels.get(factor).map_or(&[][..], Vec::as_slice);
                    if let Some(unseen) = labels.iter().find(|l| !known.contains(l)) {
                        return Err(Error::InvalidInput(format!(
                            "level {unseen:?} of factor {factor} was not present when the model was fit"
                        )));
                    }
                    FactorData::Labels(labels)
                } else {
                    let values = data.numeric_values(factor)?.into_owned();
                    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
                        return Err(Error::InvalidInput(format!(
                            "factor {factor} contains non-finite value {bad}"
                        )));
                    }
                    FactorData::Numeric(values)
                };
                cache.insert(factor, values);
            }
        }

        let rows = data.num_rows();
        let mut matrix = DMatrix::from_element(rows, self.columns.len(), 1.0);
        for (j, column) in self.columns.iter().enumerate() {
            for part in &column.parts {
                for i in 0..rows {
                    let factor = match part {
                        Part::Numeric(f) | Part::Square(f) => f.as_str(),
                        Part::Indicator { factor, .. } => factor.as_str(),
                    };
                    let cell = match (part, cache.get(factor)) {
                        (Part::Numeric(_), Some(FactorData::Numeric(v))) => v[i],
                        (Part::Square(_), Some(FactorData::Numeric(v))) => v[i] * v[i],
                        (Part::Indicator { level, .. }, Some(FactorData::Labels(l))) => {
                            if l[i] == *level {
                                1.0
                            } else {
                                0.0
                            }
                        }
                        _ => {
                            return Err(Error::ColumnType {
                                column: factor.to_string(),
                                expected: "declared role",
                                detail: "factor used with conflicting roles".to_string(),
                            })
                        }
                    };
                    matrix[(i, j)] *= cell;
                }
            }
        }
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ModelType;
    use crate::roles::FactorRoles;

    fn data() -> Dataset {
        Dataset::new()
            .with_categorical("Buffer", ["Tris", "HEPES", "Tris", "MES"])
            .unwrap()
            .with_numeric("NaCl", vec![100.0, 200.0, 300.0, 400.0])
            .unwrap()
            .with_numeric("y", vec![1.0, 2.0, 3.0, 4.0])
            .unwrap()
    }

    fn roles() -> FactorRoles {
        FactorRoles::new(&["Buffer", "NaCl"], &["Buffer"], &["NaCl"]).unwrap()
    }

    #[test]
    fn test_sorted_levels_numeric_aware() {
        let labels: Vec<String> =
            ["8", "10", "7.5", "Tris", "8"].iter().map(|s| s.to_string()).collect();
        assert_eq!(sorted_levels(&labels), vec!["7.5", "8", "10", "Tris"]);
    }

    #[test]
    fn test_sorted_levels_keeps_distinct_spellings() {
        let labels: Vec<String> =
            ["7.0", "7", "Tris ", "Tris", "7"].iter().map(|s| s.to_string()).collect();
        assert_eq!(sorted_levels(&labels), vec!["7", "7.0", "Tris", "Tris "]);
    }

    #[test]
    fn test_equal_numeric_spellings_encode_as_own_levels() {
        let data = Dataset::new()
            .with_categorical("pH", ["7", "7.0", "8", "8", "7", "7.0"])
            .unwrap()
            .with_numeric("y", vec![1.0, 2.0, 3.0, 3.0, 1.0, 2.0])
            .unwrap();
        let roles = FactorRoles::new(&["pH"], &["pH"], &[]).unwrap();
        let terms = TermSet::build(&roles, "y", ModelType::Linear);
        let encoder = DesignEncoder::new(&terms, &data).unwrap();
        assert_eq!(
            encoder.column_names(),
            vec!["Intercept", "C(Q('pH'))[T.7.0]", "C(Q('pH'))[T.8]"]
        );

        // Every fitting label encodes, and each row gets at most one indicator
        let x = encoder.encode(&data).unwrap();
        assert_eq!(x.row(1).iter().copied().collect::<Vec<_>>(), vec![1.0, 1.0, 0.0]);
        assert_eq!(x.row(2).iter().copied().collect::<Vec<_>>(), vec![1.0, 0.0, 1.0]);
        assert_eq!(x.row(4).iter().copied().collect::<Vec<_>>(), vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_treatment_coding_columns() {
        let terms = TermSet::build(&roles(), "y", ModelType::Interactions);
        let encoder = DesignEncoder::new(&terms, &data()).unwrap();
        assert_eq!(
            encoder.column_names(),
            vec![
                "Intercept",
                "C(Q('Buffer'))[T.MES]",
                "C(Q('Buffer'))[T.Tris]",
                "Q('NaCl')",
                "C(Q('Buffer'))[T.MES]:Q('NaCl')",
                "C(Q('Buffer'))[T.Tris]:Q('NaCl')",
            ]
        );

        let x = encoder.encode(&data()).unwrap();
        assert_eq!(x.shape(), (4, 6));
        // Row 0: Tris, NaCl 100
        let row: Vec<_> = x.row(0).iter().copied().collect();
        assert_eq!(row, vec![1.0, 0.0, 1.0, 100.0, 0.0, 100.0]);
        // Row 1: HEPES is the reference level
        let row: Vec<_> = x.row(1).iter().copied().collect();
        assert_eq!(row, vec![1.0, 0.0, 0.0, 200.0, 0.0, 0.0]);
    }

    #[test]
    fn test_unseen_level_rejected() {
        let terms = TermSet::build(&roles(), "y", ModelType::Linear);
        let encoder = DesignEncoder::new(&terms, &data()).unwrap();
        let new = Dataset::new()
            .with_categorical("Buffer", ["PBS"])
            .unwrap()
            .with_numeric("NaCl", vec![150.0])
            .unwrap();
        assert!(matches!(encoder.encode(&new), Err(Error::InvalidInput(_))));
    }
}
