use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("i2c error: {0}")]
    I2c(String),
    #[error("conversion-ready timeout")]
    Timeout,
    #[error("device model: {0}")]
    Model(String),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("event receiver disconnected")]
    Disconnected,
}

pub type Result<T> = std::result::Result<T, HwError>;
