use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("invalid rotor profile: {0}")]
    InvalidProfile(String),
    #[error("invalid switch ordinal {ordinal} (switch count {count})")]
    InvalidOrdinal { ordinal: usize, count: usize },
}

pub type Result<T> = std::result::Result<T, HwError>;
