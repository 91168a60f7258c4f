//! Built-in Gaussian-process backend
//!
//! Parameters are encoded into the unit hypercube (ranges scaled to
//! `[0, 1]`, choices one-hot) and modelled with an RBF-kernel GP on
//! standardized responses. Each suggestion is the best of
//! `candidate_count` random candidates under expected improvement. Until
//! two observations exist, suggestions are uniform random samples.

use nalgebra::{Cholesky, DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::{Continuous, ContinuousCDF, Normal};
use tracing::debug;

use super::backend::{
    Availability, BackendProvider, Objective, OptimizerBackend, Parameters, SearchSpace,
};
use super::ParameterBounds;
use crate::config::OptimizerConfig;
use crate::table::Value;
use crate::{Error, Result};

const JITTER: [f64; 4] = [0.0, 1e-10, 1e-8, 1e-6];

/// Provider for [`GaussianProcessBackend`]; always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct GaussianProcessProvider;

impl BackendProvider for GaussianProcessProvider {
    fn name(&self) -> &str {
        "gaussian-process"
    }

    fn availability(&self) -> Availability {
        Availability::Available
    }

    fn create(
        &self,
        space: SearchSpace,
        config: &OptimizerConfig,
    ) -> Result<Box<dyn OptimizerBackend>> {
        Ok(Box::new(GaussianProcessBackend::new(space, config)?))
    }
}

/// GP regression + expected improvement over a [`SearchSpace`].
#[derive(Debug)]
pub struct GaussianProcessBackend {
    space: SearchSpace,
    config: OptimizerConfig,
    rng: StdRng,
    inputs: Vec<Vec<f64>>,
    targets: Vec<f64>,
}

impl GaussianProcessBackend {
    /// Create a backend.
    ///
    /// # Errors
    /// Returns error if the configuration is out of range.
    pub fn new(space: SearchSpace, config: &OptimizerConfig) -> Result<Self> {
        config.validate()?;
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Ok(Self {
            space,
            config: config.clone(),
            rng,
            inputs: Vec::new(),
            targets: Vec::new(),
        })
    }

    fn random_candidate(&mut self) -> Parameters {
        let mut parameters = Parameters::new();
        for spec in self.space.parameters() {
            let value = match &spec.bounds {
                ParameterBounds::Range { lower, upper } => {
                    Value::Number(lower + self.rng.gen::<f64>() * (upper - lower))
                }
                ParameterBounds::Choice { values } => {
                    Value::Text(values[self.rng.gen_range(0..values.len())].clone())
                }
            };
            parameters.insert(spec.name.clone(), value);
        }
        parameters
    }

    fn encode(&self, parameters: &Parameters) -> Result<Vec<f64>> {
        let mut point = Vec::new();
        for spec in self.space.parameters() {
            let value = parameters.get(&spec.name).ok_or_else(|| {
                Error::InvalidInput(format!("missing value for parameter {}", spec.name))
            })?;
            match &spec.bounds {
                ParameterBounds::Range { lower, upper } => {
                    let v = value.as_f64().ok_or_else(|| {
                        Error::InvalidInput(format!(
                            "parameter {} expects a number, got {value}",
                            spec.name
                        ))
                    })?;
                    let width = upper - lower;
                    point.push(if width > 0.0 { (v - lower) / width } else { 0.5 });
                }
                ParameterBounds::Choice { values } => {
                    let label = value.label();
                    let index = values.iter().position(|c| *c == label).ok_or_else(|| {
                        Error::InvalidInput(format!(
                            "parameter {} has no choice {label:?}",
                            spec.name
                        ))
                    })?;
                    point.extend((0..values.len()).map(|i| if i == index { 1.0 } else { 0.0 }));
                }
            }
        }
        Ok(point)
    }

    fn kernel(&self, a: &[f64], b: &[f64]) -> f64 {
        let squared: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
        let scale = self.config.length_scale;
        (-squared / (2.0 * scale * scale)).exp()
    }

    fn factorize(&self) -> Result<Cholesky<f64, nalgebra::Dyn>> {
        let n = self.inputs.len();
        let gram = DMatrix::from_fn(n, n, |i, j| self.kernel(&self.inputs[i], &self.inputs[j]));
        for jitter in JITTER {
            let noise = self.config.noise + jitter;
            let mut k = gram.clone();
            for i in 0..n {
                k[(i, i)] += noise;
            }
            if let Some(chol) = Cholesky::new(k) {
                return Ok(chol);
            }
        }
        Err(Error::Backend(format!(
            "kernel matrix over {n} observations is not positive definite"
        )))
    }

    #[allow(clippy::cast_precision_loss)]
    fn expected_improvement_suggestion(&mut self) -> Result<Parameters> {
        let n = self.targets.len() as f64;
        let mean = self.targets.iter().sum::<f64>() / n;
        let spread = (self.targets.iter().map(|y| (y - mean).powi(2)).sum::<f64>() / n).sqrt();
        let spread = if spread > 0.0 { spread } else { 1.0 };
        let y = DVector::from_iterator(
            self.targets.len(),
            self.targets.iter().map(|t| (t - mean) / spread),
        );
        let best = y.max();

        let chol = self.factorize()?;
        let alpha = chol.solve(&y);
        let lower = chol.l();
        let normal = Normal::new(0.0, 1.0).map_err(|e| Error::Backend(e.to_string()))?;
        let xi = self.config.exploration;

        let mut chosen: Option<(f64, Parameters)> = None;
        for _ in 0..self.config.candidate_count {
            let candidate = self.random_candidate();
            let point = self.encode(&candidate)?;
            let k_star = DVector::from_iterator(
                self.inputs.len(),
                self.inputs.iter().map(|x| self.kernel(x, &point)),
            );
            let mu = k_star.dot(&alpha);
            let v = lower
                .solve_lower_triangular(&k_star)
                .ok_or_else(|| Error::Backend("triangular solve failed".to_string()))?;
            let sigma = (1.0 - v.dot(&v)).max(1e-12).sqrt();
            let gain = mu - best - xi;
            let z = gain / sigma;
            let ei = gain.mul_add(normal.cdf(z), sigma * normal.pdf(z));
            if chosen.as_ref().map_or(true, |(top, _)| ei > *top) {
                chosen = Some((ei, candidate));
            }
        }

        let (ei, parameters) =
            chosen.ok_or_else(|| Error::Backend("no candidates were scored".to_string()))?;
        debug!(expected_improvement = ei, observations = self.inputs.len(), "gp suggestion");
        Ok(parameters)
    }
}

impl OptimizerBackend for GaussianProcessBackend {
    fn suggest(&mut self) -> Result<Parameters> {
        if self.targets.len() < 2 {
            return Ok(self.random_candidate());
        }
        self.expected_improvement_suggestion()
    }

    fn observe(&mut self, parameters: &Parameters, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(Error::InvalidInput(format!(
                "response must be finite, got {value}"
            )));
        }
        let point = self.encode(parameters)?;
        let oriented = match self.space.objective() {
            Objective::Maximize => value,
            Objective::Minimize => -value,
        };
        self.inputs.push(point);
        self.targets.push(oriented);
        Ok(())
    }

    fn observation_count(&self) -> usize {
        self.targets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::ParameterSpec;

    fn space(objective: Objective) -> SearchSpace {
        SearchSpace::new(
            vec![
                ParameterSpec {
                    name: "x".to_string(),
                    bounds: ParameterBounds::Range { lower: 0.0, upper: 10.0 },
                },
                ParameterSpec {
                    name: "buffer".to_string(),
                    bounds: ParameterBounds::Choice {
                        values: vec!["Tris".to_string(), "HEPES".to_string()],
                    },
                },
            ],
            objective,
        )
        .unwrap()
    }

    fn config() -> OptimizerConfig {
        OptimizerConfig {
            seed: Some(11),
            candidate_count: 256,
            ..OptimizerConfig::default()
        }
    }

    fn point(x: f64, buffer: &str) -> Parameters {
        Parameters::from([
            ("x".to_string(), Value::from(x)),
            ("buffer".to_string(), Value::from(buffer)),
        ])
    }

    #[test]
    fn test_suggestions_within_bounds() {
        let mut backend =
            GaussianProcessBackend::new(space(Objective::Maximize), &config()).unwrap();
        for (x, b, y) in [(1.0, "Tris", 1.0), (5.0, "HEPES", 3.0), (9.0, "Tris", 2.0)] {
            backend.observe(&point(x, b), y).unwrap();
        }
        for _ in 0..5 {
            let suggestion = backend.suggest().unwrap();
            let x = suggestion["x"].as_f64().unwrap();
            assert!((0.0..=10.0).contains(&x));
            assert!(["Tris", "HEPES"].contains(&suggestion["buffer"].as_text().unwrap()));
        }
    }

    #[test]
    fn test_seeded_backends_agree() {
        let mut a = GaussianProcessBackend::new(space(Objective::Minimize), &config()).unwrap();
        let mut b = GaussianProcessBackend::new(space(Objective::Minimize), &config()).unwrap();
        for backend in [&mut a, &mut b] {
            backend.observe(&point(2.0, "Tris"), 4.0).unwrap();
            backend.observe(&point(8.0, "HEPES"), 1.0).unwrap();
        }
        assert_eq!(a.suggest().unwrap(), b.suggest().unwrap());
    }

    #[test]
    fn test_observe_rejects_unknown_choice() {
        let mut backend =
            GaussianProcessBackend::new(space(Objective::Maximize), &config()).unwrap();
        assert!(matches!(
            backend.observe(&point(1.0, "PBS"), 1.0),
            Err(Error::InvalidInput(_))
        ));
        assert_eq!(backend.observation_count(), 0);
    }

    #[test]
    fn test_ei_prefers_region_near_best() {
        // Maximum of a bump at x = 7
        let mut backend = GaussianProcessBackend::new(
            SearchSpace::new(
                vec![ParameterSpec {
                    name: "x".to_string(),
                    bounds: ParameterBounds::Range { lower: 0.0, upper: 10.0 },
                }],
                Objective::Maximize,
            )
            .unwrap(),
            &OptimizerConfig {
                seed: Some(3),
                exploration: 0.0,
                ..OptimizerConfig::default()
            },
        )
        .unwrap();
        for x in [0.0, 2.0, 4.0, 6.0, 7.0, 8.0, 10.0] {
            let y = -(x - 7.0f64).powi(2);
            backend
                .observe(&Parameters::from([("x".to_string(), Value::from(x))]), y)
                .unwrap();
        }
        let x = backend.suggest().unwrap()["x"].as_f64().unwrap();
        assert!((5.0..=9.0).contains(&x), "suggested {x}");
    }
}
