//! Ordinary least squares with OLS-with-intercept summary statistics

use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};

use super::ModelStatistics;

/// Spread of the response, in units of rounding error at its magnitude,
/// below which it is treated as constant.
const DEGENERATE_ULPS: f64 = 16.0;

/// Singular values below this fraction of the largest count as zero.
const RANK_RTOL: f64 = 1e-10;

pub(crate) struct OlsFit {
    pub estimates: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub t_values: Vec<f64>,
    pub p_values: Vec<f64>,
    pub fitted: Vec<f64>,
    pub residuals: Vec<f64>,
    pub statistics: ModelStatistics,
}

/// Solve `y ≈ Xβ` by SVD. `x` must carry the intercept column.
///
/// Fails with a human-readable reason when there are fewer rows than
/// columns or the design is rank deficient.
#[allow(clippy::cast_precision_loss, clippy::many_single_char_names)]
pub(crate) fn fit(x: &DMatrix<f64>, y: &[f64]) -> std::result::Result<OlsFit, String> {
    let (n, p) = x.shape();
    if n < p {
        return Err(format!(
            "{p} model coefficients need at least {p} observations, got {n}"
        ));
    }
    if let Some(bad) = y.iter().find(|v| !v.is_finite()) {
        return Err(format!("response contains non-finite value {bad}"));
    }

    let svd = x.clone().svd(true, true);
    let largest = svd.singular_values.max();
    let tolerance = largest * RANK_RTOL;
    let rank = svd.singular_values.iter().filter(|s| **s > tolerance).count();
    if rank < p {
        return Err(format!(
            "design matrix is rank deficient (rank {rank} of {p}); some terms are confounded"
        ));
    }

    let y_vec = DVector::from_column_slice(y);
    let beta = svd.solve(&y_vec, tolerance).map_err(str::to_string)?;
    let v_t = svd
        .v_t
        .as_ref()
        .ok_or_else(|| "SVD did not produce right singular vectors".to_string())?;

    // (XᵀX)⁻¹ = V Σ⁻² Vᵀ
    let inv_sq = DVector::from_iterator(p, svd.singular_values.iter().map(|s| 1.0 / (s * s)));
    let v = v_t.transpose();
    let unscaled_cov = &v * DMatrix::from_diagonal(&inv_sq) * v_t;

    let fitted_vec = x * &beta;
    let residual_vec = &y_vec - &fitted_vec;

    let nobs = n as f64;
    let df_model = (p - 1) as f64;
    let df_resid = (n - p) as f64;
    let mean = y.iter().sum::<f64>() / nobs;
    let ssr = residual_vec.norm_squared();
    let tss: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    let magnitude = y.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
    let degenerate = tss <= nobs * (DEGENERATE_ULPS * f64::EPSILON * magnitude).powi(2);

    let mse_resid = if df_resid > 0.0 { ssr / df_resid } else { f64::NAN };
    let (r_squared, adj_r_squared) = if degenerate {
        (0.0, 0.0)
    } else {
        let r2 = 1.0 - ssr / tss;
        let adj = if df_resid > 0.0 {
            1.0 - (nobs - 1.0) / df_resid * (1.0 - r2)
        } else {
            f64::NAN
        };
        (r2, adj)
    };

    let (f_statistic, f_pvalue) = if degenerate || df_model == 0.0 || df_resid == 0.0 {
        (f64::NAN, f64::NAN)
    } else {
        let f = ((tss - ssr) / df_model) / mse_resid;
        let pvalue = FisherSnedecor::new(df_model, df_resid).map_or(f64::NAN, |dist| dist.sf(f));
        (f, pvalue)
    };

    let llf = -nobs / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (ssr / nobs).ln() + 1.0);
    let k = p as f64;
    let aic = -2.0 * llf + 2.0 * k;
    let bic = -2.0 * llf + nobs.ln() * k;

    let students_t = StudentsT::new(0.0, 1.0, df_resid).ok();
    let estimates: Vec<f64> = beta.iter().copied().collect();
    let std_errors: Vec<f64> = (0..p)
        .map(|j| (unscaled_cov[(j, j)] * mse_resid).sqrt())
        .collect();
    let t_values: Vec<f64> = estimates
        .iter()
        .zip(&std_errors)
        .map(|(b, se)| b / se)
        .collect();
    let p_values: Vec<f64> = t_values
        .iter()
        .map(|t| match (&students_t, degenerate) {
            (Some(dist), false) if !t.is_nan() => 2.0 * dist.sf(t.abs()),
            _ => f64::NAN,
        })
        .collect();

    Ok(OlsFit {
        estimates,
        std_errors,
        t_values,
        p_values,
        fitted: fitted_vec.iter().copied().collect(),
        residuals: residual_vec.iter().copied().collect(),
        statistics: ModelStatistics {
            r_squared,
            adj_r_squared,
            rmse: mse_resid.sqrt(),
            f_statistic,
            f_pvalue,
            aic,
            bic,
            observations: n,
            df_resid,
            df_model,
            degenerate_response: degenerate,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn design(xs: &[f64]) -> DMatrix<f64> {
        DMatrix::from_fn(xs.len(), 2, |i, j| if j == 0 { 1.0 } else { xs[i] })
    }

    #[test]
    fn test_exact_line() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let y: Vec<f64> = xs.iter().map(|x| 2.0 * x + 1.0).collect();
        let fit = fit(&design(&xs), &y).unwrap();
        assert_relative_eq!(fit.estimates[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(fit.estimates[1], 2.0, epsilon = 1e-9);
        assert_relative_eq!(fit.statistics.r_squared, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_noisy_line_statistics() {
        // y = 1 + 2x with residuals (+0.1, -0.1, -0.1, +0.1)
        let xs = [1.0, 2.0, 3.0, 4.0];
        let y = [3.1, 4.9, 6.9, 9.1];
        let fit = fit(&design(&xs), &y).unwrap();
        let stats = fit.statistics;

        assert_relative_eq!(fit.estimates[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(fit.estimates[1], 2.0, epsilon = 1e-9);
        assert_eq!(stats.observations, 4);
        assert_relative_eq!(stats.df_resid, 2.0);
        assert_relative_eq!(stats.df_model, 1.0);
        // ssr = 0.04, tss = 20.04
        assert_relative_eq!(stats.r_squared, 1.0 - 0.04 / 20.04, epsilon = 1e-12);
        assert_relative_eq!(stats.rmse, (0.02f64).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(stats.f_statistic, 20.0 / 0.02, epsilon = 1e-6);
        assert!(stats.f_pvalue < 0.01);
        assert!(fit.p_values[1] < 0.01);
        assert!(!stats.degenerate_response);
    }

    #[test]
    fn test_constant_response_is_degenerate() {
        let fit = fit(&design(&[1.0, 2.0, 3.0]), &[5.0, 5.0, 5.0]).unwrap();
        assert!(fit.statistics.degenerate_response);
        assert_eq!(fit.statistics.r_squared, 0.0);
        assert!(fit.statistics.f_statistic.is_nan());
        assert!(fit.p_values.iter().all(|p| p.is_nan()));
    }

    #[test]
    fn test_large_offset_response_is_not_degenerate() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y: Vec<f64> = xs.iter().map(|x| 1e7 + x - 1.0).collect();
        let fit = fit(&design(&xs), &y).unwrap();
        assert!(!fit.statistics.degenerate_response);
        assert_relative_eq!(fit.estimates[1], 1.0, epsilon = 1e-6);
        assert_relative_eq!(fit.statistics.r_squared, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rank_deficient() {
        let x = DMatrix::from_row_slice(3, 3, &[1.0, 1.0, 2.0, 1.0, 2.0, 4.0, 1.0, 3.0, 6.0]);
        let err = fit(&x, &[1.0, 2.0, 3.0]).err().unwrap();
        assert!(err.contains("rank deficient"));
    }

    #[test]
    fn test_too_few_rows() {
        let x = DMatrix::from_row_slice(1, 2, &[1.0, 2.0]);
        assert!(fit(&x, &[1.0]).is_err());
    }

    #[test]
    fn test_saturated_model_has_nan_statistics() {
        let fit = fit(&design(&[1.0, 2.0]), &[1.0, 3.0]).unwrap();
        assert!(fit.statistics.adj_r_squared.is_nan());
        assert!(fit.statistics.rmse.is_nan());
        assert!(fit.p_values.iter().all(|p| p.is_nan()));
    }
}
