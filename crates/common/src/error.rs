//! Error types for Vitalis.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VitalisError {
    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Gateway unreachable: {0}")]
    GatewayUnreachable(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VitalisError>;
