use std::collections::HashMap;

use opentelemetry::propagation::{Extractor, Injector};

/// Writes propagation fields into message headers.
pub struct HeaderInjector<'a>(pub &'a mut HashMap<String, String>);

/// Reads propagation fields from message headers. Header names are matched
/// case-insensitively, brokers do not agree on their case.
pub struct HeaderExtractor<'a>(pub &'a HashMap<String, String>);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        self.0.insert(key.to_string(), value);
    }
}

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        if let Some(value) = self.0.get(key) {
            return Some(value.as_str());
        }
        return self.0.iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str());
    }

    fn keys(&self) -> Vec<&str> {
        return self.0.keys().map(|key| key.as_str()).collect();
    }
}
