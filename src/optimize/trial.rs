//! Trial Record - one evaluated or pending point of an optimization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Parameters;

/// Where a trial came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialSource {
    /// Row of the dataset passed to `set_data`
    Historical,
    /// Proposed by the backend
    Suggested,
    /// Reported without a matching suggestion
    External,
}

/// A parameter assignment with its response once measured.
///
/// Parameters are keyed by the original factor names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    index: usize,
    parameters: Parameters,
    response: Option<f64>,
    source: TrialSource,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Trial {
    /// Pending trial created now.
    #[must_use]
    pub fn pending(index: usize, parameters: Parameters, source: TrialSource) -> Self {
        Self {
            index,
            parameters,
            response: None,
            source,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Trial created and completed now.
    #[must_use]
    pub fn completed(
        index: usize,
        parameters: Parameters,
        source: TrialSource,
        response: f64,
    ) -> Self {
        let mut trial = Self::pending(index, parameters, source);
        trial.complete(response);
        trial
    }

    /// Position in the session's trial log.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Parameter assignment.
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Measured response, once reported.
    #[must_use]
    pub const fn response(&self) -> Option<f64> {
        self.response
    }

    /// Origin of the trial.
    #[must_use]
    pub const fn source(&self) -> TrialSource {
        self.source
    }

    /// Creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Completion timestamp.
    #[must_use]
    pub const fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Whether a response has been recorded.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.response.is_some()
    }

    /// Record the response and stamp completion.
    pub fn complete(&mut self, response: f64) {
        self.response = Some(response);
        self.completed_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;

    #[test]
    fn test_trial_lifecycle() {
        let parameters = Parameters::from([("pH".to_string(), Value::from(7.5))]);
        let mut trial = Trial::pending(0, parameters, TrialSource::Suggested);
        assert!(!trial.is_complete());
        assert!(trial.completed_at().is_none());

        trial.complete(42.0);
        assert_eq!(trial.response(), Some(42.0));
        assert!(trial.completed_at().unwrap() >= trial.created_at());
    }

    #[test]
    fn test_trial_serializes_source_lowercase() {
        let trial = Trial::completed(3, Parameters::new(), TrialSource::Historical, 1.0);
        let json = serde_json::to_string(&trial).unwrap();
        assert!(json.contains("\"source\":\"historical\""));
    }
}
