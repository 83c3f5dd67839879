use std::time::Duration;
use thiserror::Error;

/// SQLSTATE reported by PostgreSQL-compatible databases (CockroachDB among
/// them) when a transaction lost a serialization conflict and may be retried.
pub const SERIALIZATION_FAILURE: &str = "40001";

/// Failure reported by a storage writer for a single insert.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    #[error("SQL error: {message}")]
    Sql {
        message: String,
        sql_state: Option<String>,
    },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl WriteError {
    /// Generic SQL failure without a state code.
    pub fn sql(message: impl Into<String>) -> Self {
        Self::Sql {
            message: message.into(),
            sql_state: None,
        }
    }

    /// SQL failure carrying a SQLSTATE code.
    pub fn sql_with_state(message: impl Into<String>, sql_state: impl Into<String>) -> Self {
        Self::Sql {
            message: message.into(),
            sql_state: Some(sql_state.into()),
        }
    }

    pub fn serialization_failure(message: impl Into<String>) -> Self {
        Self::sql_with_state(message, SERIALIZATION_FAILURE)
    }

    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Sql { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }

    pub fn is_serialization_failure(&self) -> bool {
        self.sql_state() == Some(SERIALIZATION_FAILURE)
    }
}

/// Error returned to callers of the retrying inserter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InsertError {
    #[error("Write failed after {attempts} attempt(s), attempts exhausted: {source}")]
    WriteFailed { attempts: usize, source: WriteError },

    #[error("Write failed on attempt {attempt} with a non-retryable error: {source}")]
    NotRetryable { attempt: usize, source: WriteError },

    #[error("Insert cancelled during backoff after {attempts} attempt(s): {source}")]
    Cancelled { attempts: usize, source: WriteError },

    #[error("Insert deadline exceeded after {attempts} attempt(s) ({elapsed:?}): {source}")]
    DeadlineExceeded {
        attempts: usize,
        elapsed: Duration,
        source: WriteError,
    },

    #[error("Invalid retry policy: {0}")]
    InvalidPolicy(String),
}

impl InsertError {
    /// The most recent storage failure wrapped by this error, if any.
    pub fn last_write_error(&self) -> Option<&WriteError> {
        match self {
            Self::WriteFailed { source, .. }
            | Self::NotRetryable { source, .. }
            | Self::Cancelled { source, .. }
            | Self::DeadlineExceeded { source, .. } => Some(source),
            Self::InvalidPolicy(_) => None,
        }
    }

    /// Number of writes issued before this error was produced.
    pub fn attempts(&self) -> usize {
        match self {
            Self::WriteFailed { attempts, .. }
            | Self::Cancelled { attempts, .. }
            | Self::DeadlineExceeded { attempts, .. } => *attempts,
            Self::NotRetryable { attempt, .. } => *attempt,
            Self::InvalidPolicy(_) => 0,
        }
    }
}

pub type Result<T> = std::result::Result<T, InsertError>;
