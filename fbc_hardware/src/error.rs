use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("hardware fault: {0}")]
    Fault(String),
    #[error("sensor timeout")]
    Timeout,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
