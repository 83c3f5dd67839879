use crate::core::WriteError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    NoRetry,
    Retryable,
}

/// Decides whether a failed write is worth another attempt.
pub trait RetryClassifier: Send + Sync {
    fn classify(&self, error: &WriteError) -> RetryClass;
}

/// Treats every failure as transient.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryAll;

impl RetryClassifier for RetryAll {
    fn classify(&self, _error: &WriteError) -> RetryClass {
        RetryClass::Retryable
    }
}

/// Retries serialization conflicts (SQLSTATE 40001), SQL errors that carry no
/// state and dropped connections. Constraint violations and any other SQLSTATE
/// fail fast.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializationConflicts;

impl RetryClassifier for SerializationConflicts {
    fn classify(&self, error: &WriteError) -> RetryClass {
        match error {
            WriteError::Sql { sql_state: None, .. } | WriteError::Connection(_) => {
                RetryClass::Retryable
            }
            WriteError::Sql { .. } if error.is_serialization_failure() => RetryClass::Retryable,
            WriteError::Sql { .. } | WriteError::ConstraintViolation(_) => RetryClass::NoRetry,
        }
    }
}

impl<F> RetryClassifier for F
where
    F: Fn(&WriteError) -> RetryClass + Send + Sync,
{
    fn classify(&self, error: &WriteError) -> RetryClass {
        self(error)
    }
}
