use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum FbcError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing actuator")]
    MissingActuator,
    #[error("missing sensor")]
    MissingSensor,
    #[error("missing compute strategy")]
    MissingStrategy,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
