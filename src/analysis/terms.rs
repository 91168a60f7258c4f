//! Typed model terms and formula rendering

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

use super::ModelType;
use crate::roles::{FactorRole, FactorRoles};

/// Name of the constant term in coefficient tables.
pub const INTERCEPT: &str = "Intercept";

/// One right-hand-side term of a regression model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    /// Main effect of a factor
    Main(String),
    /// Two-way interaction
    Interaction(String, String),
    /// Squared numeric factor
    Squared(String),
}

impl Term {
    /// Factors the term involves.
    #[must_use]
    pub fn factors(&self) -> Vec<&str> {
        match self {
            Self::Main(f) | Self::Squared(f) => vec![f.as_str()],
            Self::Interaction(a, b) => vec![a.as_str(), b.as_str()],
        }
    }
}

/// Quote a column name for a formula: `Q('name')` with `\` and `'` escaped.
#[must_use]
pub fn quote(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 5);
    quoted.push_str("Q('");
    for ch in name.chars() {
        if ch == '\\' || ch == '\'' {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push_str("')");
    quoted
}

pub(crate) fn factor_label(name: &str, role: FactorRole) -> String {
    match role {
        FactorRole::Numeric => quote(name),
        FactorRole::Categorical => format!("C({})", quote(name)),
    }
}

/// Terms of a model family over declared factors, in formula order:
/// main effects, then interactions, then squares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermSet {
    response: String,
    roles: FactorRoles,
    model_type: ModelType,
    terms: Vec<Term>,
}

impl TermSet {
    /// Synthesize the terms of `model_type`.
    ///
    /// ```
    /// use scout_doe::analysis::{ModelType, Term, TermSet};
    /// use scout_doe::roles::{FactorRole, FactorRoles};
    ///
    /// # fn main() -> scout_doe::Result<()> {
    /// let roles = FactorRoles::from_pairs([
    ///     ("A", FactorRole::Categorical),
    ///     ("B", FactorRole::Numeric),
    /// ])?;
    /// let terms = TermSet::build(&roles, "y", ModelType::Quadratic);
    /// assert_eq!(terms.render(), "Q('y') ~ C(Q('A')) + Q('B') + C(Q('A')):Q('B') + I(Q('B') ** 2)");
    /// assert!(!terms.terms().contains(&Term::Squared("A".into())));
    /// # Ok(())
    /// # }
    /// ```
    #[must_use]
    pub fn build(roles: &FactorRoles, response: &str, model_type: ModelType) -> Self {
        let names: Vec<&str> = roles.names().collect();
        let mut terms: Vec<Term> = names.iter().map(|f| Term::Main((*f).to_string())).collect();

        if model_type.includes_interactions() {
            terms.extend(
                names
                    .iter()
                    .tuple_combinations()
                    .map(|(a, b)| Term::Interaction(a.to_string(), b.to_string())),
            );
        }

        if model_type.includes_squares() {
            terms.extend(
                roles
                    .numeric_factors()
                    .into_iter()
                    .map(|f| Term::Squared(f.to_string())),
            );
        }

        Self {
            response: response.to_string(),
            roles: roles.clone(),
            model_type,
            terms,
        }
    }

    /// Terms in formula order (without the intercept).
    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Response column.
    #[must_use]
    pub fn response(&self) -> &str {
        &self.response
    }

    /// Factor roles the terms were built from.
    #[must_use]
    pub const fn roles(&self) -> &FactorRoles {
        &self.roles
    }

    /// Model family.
    #[must_use]
    pub const fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// Number of terms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether there are no terms.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Formula label of one term, e.g. `C(Q('A')):Q('B')`.
    #[must_use]
    pub fn label(&self, term: &Term) -> String {
        let role = |f: &str| self.roles.role(f).unwrap_or(FactorRole::Numeric);
        match term {
            Term::Main(f) => factor_label(f, role(f)),
            Term::Interaction(a, b) => {
                format!("{}:{}", factor_label(a, role(a)), factor_label(b, role(b)))
            }
            Term::Squared(f) => format!("I({} ** 2)", quote(f)),
        }
    }

    /// Render as `response ~ term + term + …`.
    #[must_use]
    pub fn render(&self) -> String {
        let mut formula = format!("{} ~ ", quote(&self.response));
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                formula.push_str(" + ");
            }
            let _ = write!(formula, "{}", self.label(term));
        }
        formula
    }
}
