use crate::core::WriteError;
use crate::retry::{RetryAll, RetryClass, RetryClassifier, RetryPolicy, SerializationConflicts};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Which failures an inserter built from configuration retries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    #[default]
    RetryAll,
    SerializationConflicts,
}

impl RetryClassifier for ClassifierKind {
    fn classify(&self, error: &WriteError) -> RetryClass {
        match self {
            Self::RetryAll => RetryAll.classify(error),
            Self::SerializationConflicts => SerializationConflicts.classify(error),
        }
    }
}

/// File representation of the retry settings.
///
/// ```json
/// {
///   "max_attempts": 3,
///   "initial_delay_ms": 1000,
///   "backoff_multiplier": 2.0,
///   "max_delay_ms": null,
///   "overall_timeout_ms": null,
///   "classifier": "retry_all"
/// }
/// ```
///
/// Missing fields fall back to `RetryPolicy::default()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InserterConfig {
    pub max_attempts: usize,
    pub initial_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub max_delay_ms: Option<u64>,
    pub overall_timeout_ms: Option<u64>,
    pub classifier: ClassifierKind,
}

impl Default for InserterConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            initial_delay_ms: policy.initial_delay.as_millis() as u64,
            backoff_multiplier: policy.backoff_multiplier,
            max_delay_ms: None,
            overall_timeout_ms: None,
            classifier: ClassifierKind::default(),
        }
    }
}

/// Per-field overrides layered on top of a loaded `InserterConfig`.
///
/// `None` keeps the loaded value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InserterOverrides {
    pub max_attempts: Option<usize>,
    pub initial_delay_ms: Option<u64>,
    pub backoff_multiplier: Option<f64>,
    pub max_delay_ms: Option<u64>,
    pub overall_timeout_ms: Option<u64>,
    pub classifier: Option<ClassifierKind>,
}

impl InserterConfig {
    /// Apply every override that is set
    pub fn with_overrides(mut self, overrides: &InserterOverrides) -> Self {
        if let Some(max_attempts) = overrides.max_attempts {
            self.max_attempts = max_attempts;
        }
        if let Some(ms) = overrides.initial_delay_ms {
            self.initial_delay_ms = ms;
        }
        if let Some(multiplier) = overrides.backoff_multiplier {
            self.backoff_multiplier = multiplier;
        }
        if overrides.max_delay_ms.is_some() {
            self.max_delay_ms = overrides.max_delay_ms;
        }
        if overrides.overall_timeout_ms.is_some() {
            self.overall_timeout_ms = overrides.overall_timeout_ms;
        }
        if let Some(classifier) = overrides.classifier {
            self.classifier = classifier;
        }
        self
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("Invalid inserter config: {}", e))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            format!("Failed to read inserter config '{}': {}", path.display(), e)
        })?;
        Self::from_json(&raw)
    }

    /// Convert into a validated `RetryPolicy`
    pub fn to_policy(&self) -> Result<RetryPolicy, String> {
        let mut policy = RetryPolicy::new()
            .max_attempts(self.max_attempts)
            .initial_delay(Duration::from_millis(self.initial_delay_ms))
            .backoff_multiplier(self.backoff_multiplier);

        if let Some(ms) = self.max_delay_ms {
            policy = policy.max_delay(Duration::from_millis(ms));
        }
        if let Some(ms) = self.overall_timeout_ms {
            policy = policy.overall_timeout(Duration::from_millis(ms));
        }

        policy.validate()?;
        Ok(policy)
    }
}
