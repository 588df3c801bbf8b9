// Error types for the light-client chain view
use thiserror::Error;

use crate::primitives::Height;

pub type Result<T> = std::result::Result<T, ChainViewError>;

/// Reasons a weight proof fails structural verification.
///
/// Both variants point at a misbehaving or malicious peer and are always
/// surfaced to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProofError {
    #[error("Malformed weight proof: {0}")]
    Malformed(String),

    #[error("Insufficient samples: {0}")]
    InsufficientSamples(String),
}

#[derive(Error, Debug)]
pub enum ChainViewError {
    #[error("Weight proof rejected: {0}")]
    Proof(#[from] ProofError),

    #[error("Headers do not attach to peak: {0}")]
    Linkage(String),

    #[error("Invalid header at height {height}: {reason}")]
    InvalidHeader { height: Height, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<std::io::Error> for ChainViewError {
    fn from(err: std::io::Error) -> Self {
        ChainViewError::Storage(err.to_string())
    }
}

impl From<sled::Error> for ChainViewError {
    fn from(err: sled::Error) -> Self {
        ChainViewError::Storage(err.to_string())
    }
}

impl From<bincode::Error> for ChainViewError {
    fn from(err: bincode::Error) -> Self {
        ChainViewError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for ChainViewError {
    fn from(err: serde_json::Error) -> Self {
        ChainViewError::Serialization(err.to_string())
    }
}
