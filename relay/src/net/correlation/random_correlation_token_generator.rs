use uuid::Uuid;

use crate::net::correlation::correlation_token::{CorrelationToken, CorrelationTokenGenerator};

pub struct RandomCorrelationTokenGenerator {}

impl CorrelationTokenGenerator for RandomCorrelationTokenGenerator {
    fn generate(&self) -> CorrelationToken {
        return CorrelationToken::new(Uuid::new_v4().to_string());
    }
}

impl RandomCorrelationTokenGenerator {
    pub fn new() -> Self {
        return RandomCorrelationTokenGenerator {};
    }
}

impl Default for RandomCorrelationTokenGenerator {
    fn default() -> Self {
        return RandomCorrelationTokenGenerator::new();
    }
}
