//! Client error types

use reqwest::StatusCode;
use thiserror::Error;

use crate::events::LogoutReason;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Connection failed: {0}")]
    Connection(String),
}

/// Why a session could not be recovered. Every caller waiting on the same
/// refresh receives the same value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("No refresh token available")]
    MissingRefreshToken,

    #[error("Refresh rejected with status {0}")]
    Rejected(u16),

    #[error("Refresh request failed: {0}")]
    Unreachable(String),

    #[error("Token response did not contain a usable access token")]
    MalformedResponse,

    #[error("Refresh was abandoned before it completed")]
    Abandoned,
}

impl AuthFailure {
    /// `None` when the session itself is still intact
    pub fn logout_reason(&self) -> Option<LogoutReason> {
        match self {
            AuthFailure::MissingRefreshToken => Some(LogoutReason::MissingRefreshToken),
            AuthFailure::Rejected(_) => Some(LogoutReason::RefreshRejected),
            AuthFailure::Unreachable(_) => Some(LogoutReason::RefreshUnreachable),
            AuthFailure::MalformedResponse => Some(LogoutReason::InvalidRefreshResponse),
            AuthFailure::Abandoned => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Request failed with status {status}")]
    Status { status: StatusCode, body: String },

    #[error("Request unauthorized")]
    Unauthorized,

    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthFailure),

    #[error("Session error: {0}")]
    Session(#[from] tasklane_session::SessionError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            _ => None,
        }
    }

    /// True when the caller should send the user back to sign-in
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ClientError::Unauthorized | ClientError::Auth(_))
    }
}
