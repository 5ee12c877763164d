use std::time::Duration;

#[derive(Clone, Copy, Debug)]
pub struct CorrelationRegistryConfig {
    pause_expired_waiters_checker: Duration,
}

impl CorrelationRegistryConfig {
    pub fn new(pause_expired_waiters_checker: Duration) -> Self {
        return CorrelationRegistryConfig { pause_expired_waiters_checker };
    }

    pub fn get_pause_expired_waiters_checker(&self) -> Duration {
        return self.pause_expired_waiters_checker;
    }
}

impl Default for CorrelationRegistryConfig {
    fn default() -> Self {
        return Self::new(Duration::from_millis(500));
    }
}
