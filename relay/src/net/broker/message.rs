use std::collections::HashMap;

use bytes::Bytes;

pub type DeliveryTag = u64;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AckMode {
    Auto,
    Manual,
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MessageProperties {
    pub correlation_id: Option<String>,
    pub reply_to: Option<String>,
    pub headers: HashMap<String, String>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
    pub properties: MessageProperties,
    pub payload: Bytes,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Delivery {
    pub delivery_tag: DeliveryTag,
    pub message: Message,
}

impl MessageProperties {
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = Some(correlation_id.into());
        return self;
    }

    pub fn with_reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        return self;
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        self.headers = headers;
        return self;
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        return self;
    }

    pub fn get_header(&self, key: &str) -> Option<&str> {
        return self.headers.get(key).map(|value| value.as_str());
    }
}

impl Message {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        return Message {
            properties: MessageProperties::default(),
            payload: payload.into(),
        };
    }

    pub fn with_properties(payload: impl Into<Bytes>, properties: MessageProperties) -> Self {
        return Message { properties, payload: payload.into() };
    }
}
