//! Session error types

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error("Access token cannot be empty")]
    EmptyAccessToken,

    #[error("Unknown persistence mode: {0}")]
    UnknownPersistence(String),
}
