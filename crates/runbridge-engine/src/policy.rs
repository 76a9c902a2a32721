use runbridge_core::config::PollingConfig;
use std::time::Duration;

/// Fixed-interval polling with a bounded number of status reads.
///
/// The first read happens immediately; `interval` separates later ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl PollPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    pub fn from_config(config: &PollingConfig) -> Self {
        Self::new(config.interval(), config.max_attempts)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from_config(&PollingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_config_defaults() {
        let policy = PollPolicy::default();
        assert_eq!(policy.interval, Duration::from_millis(1500));
        assert_eq!(policy.max_attempts, 30);
    }
}
