use backon::{BackoffBuilder, ExponentialBackoff, ExponentialBuilder};
use std::time::Duration;

use crate::config::RetryConfig;

/// Bounded exponential schedule for restarting a failed recognizer.
#[derive(Debug, Clone)]
pub struct RestartPolicy {
    builder: ExponentialBuilder,
    initial: Duration,
}

impl RestartPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        let initial = Duration::from_millis(config.initial_delay_ms);
        let builder = ExponentialBuilder::default()
            .with_min_delay(initial)
            .with_max_delay(Duration::from_millis(config.max_delay_ms.max(config.initial_delay_ms)))
            .with_factor(config.factor.max(1.0))
            .with_max_times(config.max_attempts);
        Self { builder, initial }
    }

    /// Delay before resuming after the engine ends a session on its own.
    pub fn initial_delay(&self) -> Duration {
        self.initial
    }

    /// A fresh sequence of delays. `None` from the iterator means give up.
    pub fn schedule(&self) -> ExponentialBackoff {
        self.builder.clone().build()
    }
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self::new(&RetryConfig::default())
    }
}
