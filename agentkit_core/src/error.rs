//! Error types for the agentkit core.

use thiserror::Error;

use crate::schema::SchemaError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid action input: {0}")]
    InvalidInput(#[from] SchemaError),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Telemetry error: {0}")]
    Telemetry(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("RPC error: {0}")]
    Rpc(#[from] solana_client::client_error::ClientError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
