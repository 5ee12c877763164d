use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    pub fn new(value: impl Into<String>) -> Self {
        return CorrelationToken(value.into());
    }

    pub fn as_str(&self) -> &str {
        return &self.0;
    }

    pub fn into_string(self) -> String {
        return self.0;
    }
}

impl Display for CorrelationToken {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<String> for CorrelationToken {
    fn from(value: String) -> Self {
        return CorrelationToken(value);
    }
}

impl From<&str> for CorrelationToken {
    fn from(value: &str) -> Self {
        return CorrelationToken(value.to_string());
    }
}

pub trait CorrelationTokenGenerator: Send + Sync {
    fn generate(&self) -> CorrelationToken;
}
