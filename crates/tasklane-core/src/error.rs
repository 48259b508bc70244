//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] tasklane_storage::StorageError),

    #[error("Session error: {0}")]
    Session(#[from] tasklane_session::SessionError),

    #[error("Client error: {0}")]
    Client(#[from] tasklane_client::ClientError),

    #[error("Transport error: {0}")]
    Transport(#[from] tasklane_client::TransportError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Tenant id cannot be empty")]
    EmptyTenant,
}
