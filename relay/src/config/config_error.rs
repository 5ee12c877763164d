use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can not read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("can not parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid broker url: {0}")]
    InvalidBrokerUrl(String),
    #[error("invalid configuration: {0}")]
    Validation(String),
}
