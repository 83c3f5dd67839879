use crate::core::WriteError;
use crate::interface::StorageWriter;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Fails the first `fail_times` writes, then delegates to the inner writer.
///
/// Stands in for a contended CockroachDB cluster in demos and tests: the
/// default injected error is a serialization failure (SQLSTATE 40001).
pub struct FlakyWriter<W> {
    inner: W,
    fail_times: usize,
    error: WriteError,
    calls: AtomicUsize,
}

impl<W> FlakyWriter<W> {
    pub fn new(inner: W, fail_times: usize) -> Self {
        Self {
            inner,
            fail_times,
            error: WriteError::serialization_failure(
                "restart transaction: TransactionRetryWithProtoRefreshError",
            ),
            calls: AtomicUsize::new(0),
        }
    }

    /// Use `error` for the injected failures
    pub fn with_error(mut self, error: WriteError) -> Self {
        self.error = error;
        self
    }

    /// Writes attempted so far, failed ones included
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &W {
        &self.inner
    }
}

#[async_trait]
impl<W: StorageWriter> StorageWriter for FlakyWriter<W> {
    type Item = W::Item;
    type Id = W::Id;

    async fn insert(&self, item: &Self::Item) -> Result<Self::Id, WriteError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_times {
            return Err(self.error.clone());
        }
        self.inner.insert(item).await
    }
}
