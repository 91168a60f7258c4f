//! Fitted regression model

use serde::Serialize;
use std::iter;
use tracing::{debug, info, warn};

use super::encoding::DesignEncoder;
use super::terms::{TermSet, INTERCEPT};
use super::{ols, ModelType};
use crate::config::DEFAULT_SIGNIFICANCE_LEVEL;
use crate::roles::FactorRoles;
use crate::table::Dataset;
use crate::{Error, Result};

/// One row of the coefficient table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coefficient {
    /// Encoded column name, e.g. `C(Q('Buffer'))[T.Tris]`
    pub term: String,
    /// Point estimate
    pub estimate: f64,
    /// Standard error
    pub std_error: f64,
    /// t-statistic
    pub t_value: f64,
    /// Two-sided p-value (`NaN` when undefined)
    pub p_value: f64,
    /// `p_value < α`
    pub significant: bool,
}

/// Goodness-of-fit summary. Undefined quantities are `NaN`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelStatistics {
    /// Coefficient of determination
    pub r_squared: f64,
    /// R² adjusted for the number of terms
    pub adj_r_squared: f64,
    /// √(SSR / df_resid)
    pub rmse: f64,
    /// Overall F-statistic
    pub f_statistic: f64,
    /// p-value of the F-statistic
    pub f_pvalue: f64,
    /// Akaike information criterion
    pub aic: f64,
    /// Bayesian information criterion
    pub bic: f64,
    /// Number of rows fitted
    pub observations: usize,
    /// Residual degrees of freedom
    pub df_resid: f64,
    /// Model degrees of freedom (excluding the intercept)
    pub df_model: f64,
    /// The response was constant, so R² is reported as 0 and no test is
    /// meaningful
    pub degenerate_response: bool,
}

/// Result of an OLS fit. Immutable; refit to change it.
#[derive(Debug, Clone, Serialize)]
pub struct RegressionModel {
    model_type: ModelType,
    formula: String,
    terms: TermSet,
    significance_level: f64,
    coefficients: Vec<Coefficient>,
    statistics: ModelStatistics,
    fitted_values: Vec<f64>,
    residuals: Vec<f64>,
    #[serde(skip)]
    encoder: DesignEncoder,
}

impl RegressionModel {
    /// Fit with the default significance level (0.05).
    ///
    /// # Errors
    /// See [`fit_with_alpha`](Self::fit_with_alpha).
    pub fn fit(
        data: &Dataset,
        roles: &FactorRoles,
        response: &str,
        model_type: ModelType,
    ) -> Result<Self> {
        Self::fit_with_alpha(data, roles, response, model_type, DEFAULT_SIGNIFICANCE_LEVEL)
    }

    /// Fit `response` on the declared factors.
    ///
    /// # Errors
    /// Returns error if:
    /// - `alpha` is not in (0, 1)
    /// - the dataset has no rows ([`Error::NoData`])
    /// - a factor or the response column is missing
    /// - the columns cannot be encoded, there are too few rows, or the
    ///   design is rank deficient ([`Error::Fit`])
    pub fn fit_with_alpha(
        data: &Dataset,
        roles: &FactorRoles,
        response: &str,
        model_type: ModelType,
        alpha: f64,
    ) -> Result<Self> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(Error::InvalidInput(format!(
                "significance level must be in (0, 1), got {alpha}"
            )));
        }
        if data.is_empty() {
            return Err(Error::NoData("fit"));
        }
        data.require_columns(roles.names().chain(iter::once(response)))?;

        let terms = TermSet::build(roles, response, model_type);
        let formula = terms.render();
        debug!(%formula, terms = terms.len(), "synthesized model terms");

        let rows = data.num_rows();
        let failure = |reason: String| Error::Fit {
            model_type,
            formula: formula.clone(),
            rows,
            reason,
        };

        let y = data
            .numeric_values(response)
            .map_err(|e| failure(e.to_string()))?;
        let encoder = DesignEncoder::new(&terms, data).map_err(|e| failure(e.to_string()))?;
        let x = encoder.encode(data).map_err(|e| failure(e.to_string()))?;
        let fit = ols::fit(&x, &y).map_err(failure)?;

        let coefficients = encoder
            .column_names()
            .into_iter()
            .enumerate()
            .map(|(j, term)| Coefficient {
                term,
                estimate: fit.estimates[j],
                std_error: fit.std_errors[j],
                t_value: fit.t_values[j],
                p_value: fit.p_values[j],
                significant: fit.p_values[j] < alpha,
            })
            .collect();

        let statistics = fit.statistics;
        if statistics.degenerate_response {
            warn!(%formula, "response is constant; R² reported as 0 and no term is significant");
        }
        info!(
            model_type = %model_type,
            rows,
            columns = encoder.width(),
            r_squared = statistics.r_squared,
            "regression fitted"
        );

        Ok(Self {
            model_type,
            formula,
            terms,
            significance_level: alpha,
            coefficients,
            statistics,
            fitted_values: fit.fitted,
            residuals: fit.residuals,
            encoder,
        })
    }

    /// Model family.
    #[must_use]
    pub const fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// Rendered formula.
    #[must_use]
    pub fn formula(&self) -> &str {
        &self.formula
    }

    /// Structured terms.
    #[must_use]
    pub const fn terms(&self) -> &TermSet {
        &self.terms
    }

    /// α used for the significance flags.
    #[must_use]
    pub const fn significance_level(&self) -> f64 {
        self.significance_level
    }

    /// Coefficient table, intercept first.
    #[must_use]
    pub fn coefficients(&self) -> &[Coefficient] {
        &self.coefficients
    }

    /// Coefficient by encoded term name.
    #[must_use]
    pub fn coefficient(&self, term: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.term == term)
    }

    /// Goodness-of-fit statistics.
    #[must_use]
    pub const fn statistics(&self) -> &ModelStatistics {
        &self.statistics
    }

    /// In-sample predictions.
    #[must_use]
    pub fn fitted_values(&self) -> &[f64] {
        &self.fitted_values
    }

    /// Observed minus fitted.
    #[must_use]
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Terms with `p < alpha`, excluding the intercept.
    #[must_use]
    pub fn significant_terms(&self, alpha: f64) -> Vec<&str> {
        self.coefficients
            .iter()
            .filter(|c| c.term != INTERCEPT && c.p_value < alpha)
            .map(|c| c.term.as_str())
            .collect()
    }

    /// Predict the response for new rows holding the factor columns.
    ///
    /// # Errors
    /// Returns error if a factor column is missing, a value is not finite,
    /// or a categorical level was not seen during fitting.
    pub fn predict(&self, data: &Dataset) -> Result<Vec<f64>> {
        data.require_columns(self.terms.roles().names())?;
        let x = self.encoder.encode(data)?;
        let beta: Vec<f64> = self.coefficients.iter().map(|c| c.estimate).collect();
        Ok(x.row_iter()
            .map(|row| row.iter().zip(&beta).map(|(x, b)| x * b).sum())
            .collect())
    }
}
