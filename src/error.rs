//! Error types for flowcluster.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowClusterError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid cluster configuration: {0}")]
    InvalidConfig(String),

    #[error("No cluster with id {0}")]
    ClusterNotFound(u64),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "toml")]
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, FlowClusterError>;
