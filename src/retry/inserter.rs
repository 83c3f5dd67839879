use super::classify::{RetryAll, RetryClass, RetryClassifier};
use super::policy::RetryPolicy;
use crate::core::{InsertError, Result};
use crate::interface::StorageWriter;
use log::{debug, info, warn};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{Instrument, info_span};

/// Lifecycle of a single `insert` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Attempting,
    Backoff,
    Succeeded,
    Exhausted,
}

impl AttemptState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Exhausted)
    }
}

/// Outcome of a successful insert together with its retry history.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertReport<I> {
    pub id: I,
    /// Writes issued, including the successful one.
    pub attempts: usize,
    /// Backoff delays waited through, in order.
    pub delays: Vec<Duration>,
}

impl<I> InsertReport<I> {
    pub fn total_backoff(&self) -> Duration {
        self.delays.iter().sum()
    }
}

/// Wraps a `StorageWriter` with bounded retry and exponential backoff.
///
/// Attempts are strictly sequential and nothing is shared between calls, so a
/// single inserter can serve any number of concurrent callers.
///
/// # Examples
///
/// ```
/// # use cartretry::{CartItem, InMemoryCartItemStore, RetryPolicy, RetryingInserter};
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let inserter = RetryingInserter::new(InMemoryCartItemStore::new(), RetryPolicy::default())?;
///
/// let item = CartItem::new(uuid::Uuid::new_v4(), "sku-42", 1);
/// let id = inserter.insert(&item).await?;
/// println!("Inserted {}", id);
/// # Ok(())
/// # }
/// ```
pub struct RetryingInserter<W, C = RetryAll> {
    writer: W,
    policy: RetryPolicy,
    classifier: C,
}

impl<W: StorageWriter> RetryingInserter<W> {
    /// Create an inserter that retries every failure.
    pub fn new(writer: W, policy: RetryPolicy) -> Result<Self> {
        policy.validate().map_err(InsertError::InvalidPolicy)?;

        Ok(Self {
            writer,
            policy,
            classifier: RetryAll,
        })
    }
}

impl<W: StorageWriter, C: RetryClassifier> RetryingInserter<W, C> {
    /// Replace the classifier deciding which failures are retried.
    pub fn with_classifier<C2: RetryClassifier>(self, classifier: C2) -> RetryingInserter<W, C2> {
        RetryingInserter {
            writer: self.writer,
            policy: self.policy,
            classifier,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Insert `item`, retrying failed writes until the policy is exhausted.
    pub async fn insert(&self, item: &W::Item) -> Result<W::Id> {
        self.insert_with_cancel(item, futures::future::pending()).await
    }

    /// Like `insert`, but gives up as soon as `cancel` completes during a backoff.
    ///
    /// A write already in flight is never interrupted; cancellation takes
    /// effect at the next suspension point.
    pub async fn insert_with_cancel<F>(&self, item: &W::Item, cancel: F) -> Result<W::Id>
    where
        F: Future<Output = ()>,
    {
        self.insert_with_report(item, cancel)
            .await
            .map(|report| report.id)
    }

    /// Insert `item` and return the retry history alongside the identifier.
    pub async fn insert_with_report<F>(
        &self,
        item: &W::Item,
        cancel: F,
    ) -> Result<InsertReport<W::Id>>
    where
        F: Future<Output = ()>,
    {
        let span = info_span!("insert", max_attempts = self.policy.max_attempts);
        self.run(item, cancel).instrument(span).await
    }

    async fn run<F>(&self, item: &W::Item, cancel: F) -> Result<InsertReport<W::Id>>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(cancel);

        let max_attempts = self.policy.max_attempts;
        let started = Instant::now();
        let deadline = self
            .policy
            .overall_timeout
            .and_then(|timeout| started.checked_add(timeout));

        let mut state = AttemptState::Attempting;
        let mut delays = Vec::new();
        let mut attempt = 0usize;

        loop {
            let result = self.writer.insert(item).await;
            attempt += 1;

            let err = match result {
                Ok(id) => {
                    transition(&mut state, AttemptState::Succeeded, attempt);
                    if attempt > 1 {
                        info!("Insert succeeded on attempt {} of {}", attempt, max_attempts);
                    }
                    return Ok(InsertReport {
                        id,
                        attempts: attempt,
                        delays,
                    });
                }
                Err(err) => err,
            };

            if self.classifier.classify(&err) == RetryClass::NoRetry {
                transition(&mut state, AttemptState::Exhausted, attempt);
                warn!("Insert attempt {} failed with a non-retryable error: {}", attempt, err);
                return Err(InsertError::NotRetryable {
                    attempt,
                    source: err,
                });
            }

            if attempt >= max_attempts {
                transition(&mut state, AttemptState::Exhausted, attempt);
                warn!("Hit max retries ({}): {}", max_attempts, err);
                return Err(InsertError::WriteFailed {
                    attempts: attempt,
                    source: err,
                });
            }

            let delay = self.policy.delay_after(attempt - 1);

            if let Some(deadline) = deadline {
                let crosses = Instant::now()
                    .checked_add(delay)
                    .is_none_or(|wake| wake > deadline);
                if crosses {
                    transition(&mut state, AttemptState::Exhausted, attempt);
                    let elapsed = started.elapsed();
                    warn!(
                        "Insert deadline precedes next retry (attempt {} of {}, elapsed={:?}): {}",
                        attempt, max_attempts, elapsed, err
                    );
                    return Err(InsertError::DeadlineExceeded {
                        attempts: attempt,
                        elapsed,
                        source: err,
                    });
                }
            }

            warn!(
                "Insert retry (attempt {} of {}): {} (backoff={}ms)",
                attempt,
                max_attempts,
                err,
                delay.as_millis()
            );
            transition(&mut state, AttemptState::Backoff, attempt);

            tokio::select! {
                biased;
                _ = &mut cancel => {
                    transition(&mut state, AttemptState::Exhausted, attempt);
                    warn!("Insert cancelled during backoff after {} attempt(s)", attempt);
                    return Err(InsertError::Cancelled {
                        attempts: attempt,
                        source: err,
                    });
                }
                _ = tokio::time::sleep(delay) => {}
            }

            delays.push(delay);
            transition(&mut state, AttemptState::Attempting, attempt + 1);
        }
    }
}

fn transition(state: &mut AttemptState, next: AttemptState, attempt: usize) {
    debug!("insert state {:?} -> {:?} (attempt {})", state, next, attempt);
    *state = next;
}
