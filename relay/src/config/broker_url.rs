use std::fmt::{Display, Formatter};

use url::Url;

use crate::config::config_error::ConfigError;

const AMQP_PORT: u16 = 5672;
const AMQPS_PORT: u16 = 5671;
const DEFAULT_USERNAME: &str = "guest";
const DEFAULT_VIRTUAL_HOST: &str = "/";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BrokerScheme {
    Amqp,
    Amqps,
}

/// Broker connection address: `amqp[s]://user:password@host:port/vhost`.
/// Credentials and the virtual host are percent-decoded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BrokerUrl {
    scheme: BrokerScheme,
    username: String,
    password: Option<String>,
    host: String,
    port: u16,
    virtual_host: String,
}

impl BrokerUrl {
    pub fn parse(value: &str) -> Result<BrokerUrl, ConfigError> {
        let url = Url::parse(value).map_err(|err| ConfigError::InvalidBrokerUrl(err.to_string()))?;

        let scheme = match url.scheme() {
            "amqp" => BrokerScheme::Amqp,
            "amqps" => BrokerScheme::Amqps,
            other => return Err(ConfigError::InvalidBrokerUrl(format!("unsupported scheme {}", other))),
        };
        let host = match url.host_str() {
            Some(host) if !host.is_empty() => host.to_string(),
            _ => return Err(ConfigError::InvalidBrokerUrl("missing host".to_string())),
        };
        let port = url.port().unwrap_or(match scheme {
            BrokerScheme::Amqp => AMQP_PORT,
            BrokerScheme::Amqps => AMQPS_PORT,
        });

        let username = match url.username() {
            "" => DEFAULT_USERNAME.to_string(),
            username => percent_decode(username)?,
        };
        let password = match url.password() {
            None => None,
            Some(password) => Some(percent_decode(password)?),
        };
        let virtual_host = match url.path().trim_start_matches('/') {
            "" => DEFAULT_VIRTUAL_HOST.to_string(),
            path => percent_decode(path)?,
        };

        return Ok(BrokerUrl { scheme, username, password, host, port, virtual_host });
    }

    pub fn get_scheme(&self) -> BrokerScheme {
        return self.scheme;
    }

    pub fn get_username(&self) -> &str {
        return &self.username;
    }

    pub fn get_password(&self) -> Option<&str> {
        return self.password.as_deref();
    }

    pub fn get_host(&self) -> &str {
        return &self.host;
    }

    pub fn get_port(&self) -> u16 {
        return self.port;
    }

    pub fn get_virtual_host(&self) -> &str {
        return &self.virtual_host;
    }
}

impl Display for BrokerUrl {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        let scheme = match self.scheme {
            BrokerScheme::Amqp => "amqp",
            BrokerScheme::Amqps => "amqps",
        };
        let password = match self.password {
            None => "",
            Some(_) => ":***",
        };
        write!(formatter, "{}://{}{}@{}:{}/{}", scheme, self.username, password, self.host, self.port, self.virtual_host)
    }
}

fn percent_decode(raw: &str) -> Result<String, ConfigError> {
    let bytes = raw.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%' {
            let escape = raw.get(index + 1..index + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .ok_or_else(|| ConfigError::InvalidBrokerUrl(format!("bad percent escape at {}", index)))?;
            decoded.push(escape);
            index += 3;
        } else {
            decoded.push(bytes[index]);
            index += 1;
        }
    }
    return String::from_utf8(decoded).map_err(|err| ConfigError::InvalidBrokerUrl(err.to_string()));
}
