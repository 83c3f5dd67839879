use std::time::Duration;

/// Retry configuration for a single insert.
///
/// Defaults reproduce the course example exactly: three attempts, one second
/// before the first retry, doubling afterwards, no cap and no overall deadline.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total writes issued per call, including the first one.
    pub max_attempts: usize,

    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Growth factor applied to the delay after every failed attempt.
    pub backoff_multiplier: f64,

    /// Upper bound for a single delay.
    pub max_delay: Option<Duration>,

    /// Deadline for the whole retry sequence, measured from the first write.
    pub overall_timeout: Option<Duration>,
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_delay: None,
            overall_timeout: None,
        }
    }

    /// Set the total number of attempts
    pub fn max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set the delay before the first retry
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Set the backoff multiplier
    pub fn backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Cap every single delay
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    /// Bound the whole retry sequence
    pub fn overall_timeout(mut self, timeout: Duration) -> Self {
        self.overall_timeout = Some(timeout);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be > 0".to_string());
        }

        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier < 1.0 {
            return Err(format!(
                "backoff_multiplier must be a finite number >= 1.0, got {}",
                self.backoff_multiplier
            ));
        }

        if let Some(max_delay) = self.max_delay {
            if max_delay < self.initial_delay {
                return Err("max_delay cannot be lower than initial_delay".to_string());
            }
        }

        if self.overall_timeout == Some(Duration::ZERO) {
            return Err("overall_timeout must be > 0".to_string());
        }

        Ok(())
    }

    /// Delay to wait after the failed attempt with the given 0-based index.
    ///
    /// Equals `initial_delay * backoff_multiplier^attempt`, clamped to
    /// `max_delay`. Overflow saturates to `Duration::MAX`.
    pub fn delay_after(&self, attempt: usize) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let nanos = self.initial_delay.as_nanos() as f64 * self.backoff_multiplier.powi(exponent);

        let delay = if nanos.is_finite() && nanos < u64::MAX as f64 {
            Duration::from_nanos(nanos.round() as u64)
        } else {
            Duration::MAX
        };

        match self.max_delay {
            Some(cap) => delay.min(cap),
            None => delay,
        }
    }

    /// Every delay a call that never succeeds would wait through.
    ///
    /// There is no delay after the last attempt, so the schedule has
    /// `max_attempts - 1` entries.
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_attempts.saturating_sub(1))
            .map(|attempt| self.delay_after(attempt))
            .collect()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_delay, Duration::from_secs(1));
        assert_eq!(policy.backoff_multiplier, 2.0);
        assert!(policy.max_delay.is_none());
        assert!(policy.overall_timeout.is_none());
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let policy = RetryPolicy::new()
            .max_attempts(5)
            .initial_delay(Duration::from_millis(50))
            .backoff_multiplier(3.0)
            .max_delay(Duration::from_secs(1))
            .overall_timeout(Duration::from_secs(10));

        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_delay, Duration::from_millis(50));
        assert_eq!(policy.backoff_multiplier, 3.0);
        assert_eq!(policy.max_delay, Some(Duration::from_secs(1)));
        assert_eq!(policy.overall_timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_after(2), Duration::from_millis(4000));
    }

    #[test]
    fn test_delay_with_sub_second_base() {
        let policy = RetryPolicy::new()
            .initial_delay(Duration::from_millis(100))
            .backoff_multiplier(1.5);

        assert_eq!(policy.delay_after(0), Duration::from_millis(100));
        assert_eq!(policy.delay_after(1), Duration::from_millis(150));
        assert_eq!(policy.delay_after(2), Duration::from_millis(225));
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = RetryPolicy::new().max_delay(Duration::from_millis(2500));
        assert_eq!(policy.delay_after(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_after(2), Duration::from_millis(2500));
        assert_eq!(policy.delay_after(30), Duration::from_millis(2500));
    }

    #[test]
    fn test_delay_saturates() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(usize::MAX), Duration::MAX);
    }

    #[test]
    fn test_schedule_has_no_trailing_delay() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.schedule(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );

        assert!(RetryPolicy::new().max_attempts(1).schedule().is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(RetryPolicy::new().max_attempts(0).validate().is_err());
        assert!(RetryPolicy::new().backoff_multiplier(0.5).validate().is_err());
        assert!(RetryPolicy::new().backoff_multiplier(f64::NAN).validate().is_err());
        assert!(RetryPolicy::new().backoff_multiplier(f64::INFINITY).validate().is_err());
        assert!(
            RetryPolicy::new()
                .max_delay(Duration::from_millis(10))
                .validate()
                .is_err()
        );
        assert!(
            RetryPolicy::new()
                .overall_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );

        assert!(RetryPolicy::new().backoff_multiplier(1.0).validate().is_ok());
    }
}
