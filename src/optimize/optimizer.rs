//! Ask-tell optimization session over observed screening data

use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

use super::backend::{
    default_provider, Availability, BackendProvider, Objective, OptimizerBackend, ParameterSpec,
    Parameters, SearchSpace,
};
use super::bounds::{compute_bounds, ParameterBounds};
use super::sanitize::NameMapping;
use super::trial::{Trial, TrialSource};
use crate::config::{EngineConfig, OptimizerConfig};
use crate::roles::{FactorRole, FactorRoles};
use crate::table::{Dataset, Value};
use crate::{Error, Result};

/// Lifecycle position of a [`BayesianOptimizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No data yet
    Uninitialized,
    /// Data set, backend not started
    DataSet,
    /// Backend running; `suggest`/`report` allowed
    Initialized,
}

#[derive(Debug, Clone)]
struct Observations {
    data: Dataset,
    roles: FactorRoles,
    response: String,
    mapping: NameMapping,
    bounds: BTreeMap<String, ParameterBounds>,
}

/// Bayesian optimization session.
///
/// Holds its own copy of the data. Backend parameter names are sanitized
/// factor names; every map going in or out of this type uses the original
/// names.
pub struct BayesianOptimizer {
    provider: Box<dyn BackendProvider>,
    availability: Availability,
    config: OptimizerConfig,
    observations: Option<Observations>,
    backend: Option<Box<dyn OptimizerBackend>>,
    objective: Objective,
    trials: Vec<Trial>,
}

impl fmt::Debug for BayesianOptimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BayesianOptimizer")
            .field("provider", &self.provider.name())
            .field("availability", &self.availability)
            .field("state", &self.state())
            .field("objective", &self.objective)
            .field("trials", &self.trials.len())
            .finish_non_exhaustive()
    }
}

impl Default for BayesianOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl BayesianOptimizer {
    /// Session on the built-in backend with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_provider(default_provider(), OptimizerConfig::default())
    }

    /// Session on the built-in backend with the configured optimizer settings.
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::with_provider(default_provider(), config.optimizer.clone())
    }

    /// Session on a custom backend. Availability is checked once, here.
    #[must_use]
    pub fn with_provider(provider: Box<dyn BackendProvider>, config: OptimizerConfig) -> Self {
        let availability = provider.availability();
        match &availability {
            Availability::Available => {
                debug!(backend = provider.name(), "optimization backend available");
            }
            Availability::Unavailable(reason) => {
                warn!(backend = provider.name(), %reason, "optimization backend unavailable");
            }
        }
        Self {
            provider,
            availability,
            config,
            observations: None,
            backend: None,
            objective: Objective::default(),
            trials: Vec::new(),
        }
    }

    /// Result of the capability check.
    #[must_use]
    pub const fn availability(&self) -> &Availability {
        &self.availability
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        match (&self.observations, &self.backend) {
            (None, _) => SessionState::Uninitialized,
            (Some(_), None) => SessionState::DataSet,
            (Some(_), Some(_)) => SessionState::Initialized,
        }
    }

    /// Direction chosen at `initialize`.
    #[must_use]
    pub const fn objective(&self) -> Objective {
        self.objective
    }

    /// Store a copy of the data, build the name mapping and infer bounds.
    /// Resets any running optimization and its trial log.
    ///
    /// # Errors
    /// Returns error if:
    /// - a factor or the response column is missing, or the response is
    ///   declared as a factor
    /// - the response is not numeric
    /// - two factor names sanitize to the same identifier
    pub fn set_data(&mut self, data: &Dataset, roles: FactorRoles, response: &str) -> Result<()> {
        if roles.role(response).is_some() {
            return Err(Error::InvalidInput(format!(
                "response column {response} is also declared as a factor"
            )));
        }
        data.require_columns(roles.names().chain(std::iter::once(response)))?;
        data.numeric_values(response)?;

        let mapping = NameMapping::build(roles.names())?;
        let bounds = compute_bounds(data, &roles)?;
        info!(
            rows = data.num_rows(),
            factors = roles.len(),
            bounded = bounds.len(),
            "optimization data set"
        );

        self.observations = Some(Observations {
            data: data.clone(),
            roles,
            response: response.to_string(),
            mapping,
            bounds,
        });
        self.backend = None;
        self.trials.clear();
        Ok(())
    }

    /// Recompute bounds from the stored data.
    ///
    /// # Errors
    /// Returns [`Error::NoData`] before `set_data`.
    pub fn compute_bounds(&self) -> Result<BTreeMap<String, ParameterBounds>> {
        let obs = self.observations.as_ref().ok_or(Error::NoData("compute_bounds"))?;
        compute_bounds(&obs.data, &obs.roles)
    }

    /// Bounds inferred at `set_data`, keyed by original factor name.
    #[must_use]
    pub fn factor_bounds(&self) -> Option<&BTreeMap<String, ParameterBounds>> {
        self.observations.as_ref().map(|o| &o.bounds)
    }

    /// Original ↔ sanitized name mapping.
    #[must_use]
    pub fn name_mapping(&self) -> Option<&NameMapping> {
        self.observations.as_ref().map(|o| &o.mapping)
    }

    /// Start the backend and feed it every historical row with a finite
    /// response.
    ///
    /// # Errors
    /// Returns error if:
    /// - no data was set ([`Error::NoData`])
    /// - the backend is unavailable ([`Error::BackendUnavailable`])
    /// - a factor has no observed values to bound it
    /// - the backend rejects the search space or a historical row
    pub fn initialize(&mut self, minimize: bool) -> Result<()> {
        let obs = self.observations.as_ref().ok_or(Error::NoData("initialize"))?;
        if let Availability::Unavailable(reason) = &self.availability {
            return Err(Error::BackendUnavailable(reason.clone()));
        }

        let objective = Objective::from_minimize(minimize);
        let mut parameters = Vec::with_capacity(obs.mapping.len());
        for (original, sanitized) in obs.mapping.iter() {
            let bounds = obs.bounds.get(original).ok_or_else(|| {
                Error::InvalidInput(format!(
                    "factor {original} has no observed values, so its bounds are unknown"
                ))
            })?;
            parameters.push(ParameterSpec {
                name: sanitized.to_string(),
                bounds: bounds.clone(),
            });
        }
        let space = SearchSpace::new(parameters, objective)?;
        let mut backend = self.provider.create(space, &self.config)?;

        let history = historical_rows(obs)?;
        let mut trials = Vec::with_capacity(history.len());
        for (parameters, response) in history {
            backend.observe(&to_sanitized(&obs.mapping, &parameters)?, response)?;
            let trial =
                Trial::completed(trials.len(), parameters, TrialSource::Historical, response);
            trials.push(trial);
        }

        info!(
            backend = self.provider.name(),
            ?objective,
            historical = trials.len(),
            "optimizer initialized"
        );
        self.objective = objective;
        self.trials = trials;
        self.backend = Some(backend);
        Ok(())
    }

    /// Ask the backend for the next experiment, keyed by original names.
    ///
    /// # Errors
    /// Returns [`Error::NotInitialized`] before `initialize`, or the
    /// backend's error.
    pub fn suggest(&mut self) -> Result<Parameters> {
        let backend = self.backend.as_mut().ok_or(Error::NotInitialized("suggest"))?;
        let obs = self.observations.as_ref().ok_or(Error::NoData("suggest"))?;
        let raw = backend.suggest()?;
        let parameters = to_original(&obs.mapping, raw)?;
        debug!(trial = self.trials.len(), ?parameters, "suggested");
        self.trials
            .push(Trial::pending(self.trials.len(), parameters.clone(), TrialSource::Suggested));
        Ok(parameters)
    }

    /// Ask for `count` experiments in one go.
    ///
    /// # Errors
    /// See [`suggest`](Self::suggest).
    pub fn suggest_batch(&mut self, count: usize) -> Result<Vec<Parameters>> {
        (0..count).map(|_| self.suggest()).collect()
    }

    /// Tell the backend the measured response for `parameters` (original
    /// names). Completes the matching pending suggestion, or logs an
    /// external trial.
    ///
    /// # Errors
    /// Returns error if:
    /// - called before `initialize` ([`Error::NotInitialized`])
    /// - a key is not a factor ([`Error::UnknownFactor`])
    /// - a factor is missing or the response is not finite
    pub fn report(&mut self, parameters: &Parameters, response: f64) -> Result<()> {
        let backend = self.backend.as_mut().ok_or(Error::NotInitialized("report"))?;
        let obs = self.observations.as_ref().ok_or(Error::NoData("report"))?;
        if !response.is_finite() {
            return Err(Error::InvalidInput(format!(
                "response must be finite, got {response}"
            )));
        }
        let sanitized = to_sanitized(&obs.mapping, parameters)?;
        backend.observe(&sanitized, response)?;

        let pending = self.trials.iter_mut().find(|t| {
            t.source() == TrialSource::Suggested && !t.is_complete() && t.parameters() == parameters
        });
        match pending {
            Some(trial) => {
                debug!(trial = trial.index(), response, "suggestion completed");
                trial.complete(response);
            }
            None => {
                debug!(trial = self.trials.len(), response, "external result recorded");
                let index = self.trials.len();
                let trial =
                    Trial::completed(index, parameters.clone(), TrialSource::External, response);
                self.trials.push(trial);
            }
        }
        Ok(())
    }

    /// Trial log in creation order.
    #[must_use]
    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }

    /// Suggestions still waiting for a result.
    pub fn pending_trials(&self) -> impl Iterator<Item = &Trial> {
        self.trials.iter().filter(|t| !t.is_complete())
    }

    /// Best completed trial under the session's objective.
    #[must_use]
    pub fn best_observed(&self) -> Option<&Trial> {
        self.trials
            .iter()
            .filter(|t| t.response().is_some())
            .fold(None, |best: Option<&Trial>, trial| match best {
                Some(b) if !self.objective.improves(
                    trial.response().unwrap_or(f64::NAN),
                    b.response().unwrap_or(f64::NAN),
                ) => Some(b),
                _ => Some(trial),
            })
    }
}

fn historical_rows(obs: &Observations) -> Result<Vec<(Parameters, f64)>> {
    let responses = obs.data.numeric_values(&obs.response)?;
    let mut columns: Vec<(&str, Vec<Value>)> = Vec::with_capacity(obs.roles.len());
    for (factor, role) in obs.roles.iter() {
        let values = match role {
            FactorRole::Numeric => obs
                .data
                .numeric_values(factor)?
                .iter()
                .map(|v| Value::Number(*v))
                .collect(),
            FactorRole::Categorical => {
                obs.data.labels(factor)?.into_iter().map(Value::Text).collect()
            }
        };
        columns.push((factor, values));
    }

    let mut rows = Vec::new();
    for (row, &response) in responses.iter().enumerate() {
        if !response.is_finite() {
            continue;
        }
        let parameters: Parameters = columns
            .iter()
            .map(|(factor, values)| ((*factor).to_string(), values[row].clone()))
            .collect();
        if parameters
            .values()
            .any(|v| matches!(v, Value::Number(n) if n.is_nan()))
        {
            continue;
        }
        rows.push((parameters, response));
    }
    Ok(rows)
}

fn to_sanitized(mapping: &NameMapping, parameters: &Parameters) -> Result<Parameters> {
    let mut sanitized = Parameters::new();
    for (name, value) in parameters {
        let key = mapping
            .sanitized(name)
            .ok_or_else(|| Error::UnknownFactor(name.clone()))?;
        sanitized.insert(key.to_string(), value.clone());
    }
    if let Some((missing, _)) = mapping.iter().find(|(o, _)| !parameters.contains_key(*o)) {
        return Err(Error::InvalidInput(format!("missing value for factor {missing}")));
    }
    Ok(sanitized)
}

fn to_original(mapping: &NameMapping, parameters: Parameters) -> Result<Parameters> {
    parameters
        .into_iter()
        .map(|(key, value)| {
            mapping
                .original(&key)
                .map(|original| (original.to_string(), value))
                .ok_or_else(|| Error::Backend(format!("backend returned unknown parameter {key}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::UnavailableProvider;

    fn data() -> Dataset {
        Dataset::new()
            .with_numeric("NaCl (mM)", vec![50.0, 100.0, 150.0, 200.0])
            .unwrap()
            .with_categorical("Buffer", ["Tris", "HEPES", "Tris", "HEPES"])
            .unwrap()
            .with_numeric("Tm", vec![50.0, 52.0, f64::NAN, 55.0])
            .unwrap()
    }

    fn roles() -> FactorRoles {
        FactorRoles::new(&["NaCl (mM)", "Buffer"], &["Buffer"], &[]).unwrap()
    }

    #[test]
    fn test_state_transitions() {
        let mut optimizer = BayesianOptimizer::with_provider(
            Box::new(UnavailableProvider::new("offline")),
            OptimizerConfig::default(),
        );
        assert_eq!(optimizer.state(), SessionState::Uninitialized);
        assert!(matches!(optimizer.initialize(false), Err(Error::NoData(_))));

        optimizer.set_data(&data(), roles(), "Tm").unwrap();
        assert_eq!(optimizer.state(), SessionState::DataSet);
        assert!(matches!(optimizer.suggest(), Err(Error::NotInitialized(_))));
        assert!(matches!(
            optimizer.initialize(false),
            Err(Error::BackendUnavailable(reason)) if reason == "offline"
        ));
    }

    #[test]
    fn test_set_data_builds_mapping_and_bounds() {
        let mut optimizer = BayesianOptimizer::with_provider(
            Box::new(UnavailableProvider::new("offline")),
            OptimizerConfig::default(),
        );
        optimizer.set_data(&data(), roles(), "Tm").unwrap();
        assert_eq!(optimizer.name_mapping().unwrap().sanitized("NaCl (mM)"), Some("NaCl_mM"));
        assert_eq!(
            optimizer.factor_bounds().unwrap()["NaCl (mM)"],
            ParameterBounds::Range { lower: 50.0, upper: 200.0 }
        );
        assert_eq!(optimizer.compute_bounds().unwrap().len(), 2);
    }

    #[test]
    fn test_historical_rows_skip_missing_response() {
        let mut optimizer = BayesianOptimizer::new();
        optimizer.set_data(&data(), roles(), "Tm").unwrap();
        let rows = historical_rows(optimizer.observations.as_ref().unwrap()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].0["Buffer"], Value::from("HEPES"));
    }

    #[test]
    fn test_to_sanitized_rejects_unknown_and_missing() {
        let mapping = NameMapping::build(["NaCl (mM)", "Buffer"]).unwrap();
        let unknown = Parameters::from([("KCl".to_string(), Value::from(1.0))]);
        assert!(matches!(to_sanitized(&mapping, &unknown), Err(Error::UnknownFactor(_))));

        let partial = Parameters::from([("Buffer".to_string(), Value::from("Tris"))]);
        assert!(matches!(to_sanitized(&mapping, &partial), Err(Error::InvalidInput(_))));
    }
}
