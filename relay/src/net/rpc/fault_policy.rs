use serde::{Deserialize, Serialize};

/// What a worker sends back when its handler fails.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultPolicy {
    /// Reply with the fault message and an error status header.
    #[default]
    ErrorResponse,
    /// Send nothing; the caller observes a timeout.
    Silence,
}
