//! Tasklane API Client
//!
//! Authenticated HTTP access to the Tasklane backend:
//! - tenant and bearer headers on every call
//! - one coordinated refresh when the access token expires
//! - calls that fail meanwhile wait and are replayed in order
//! - `auth:logout` is broadcast when the session cannot be recovered

mod client;
mod error;
mod events;
mod guard;
mod queue;
mod request;
mod state;
mod tokens;
mod transport;

pub use client::{ApiClient, Credentials, DEFAULT_LOGIN_PATH};
pub use error::{AuthFailure, ClientError, TransportError};
pub use events::{LogoutBus, LogoutEvent, LogoutReason, LOGOUT_EVENT};
pub use guard::{GuardSettings, SessionGuard, DEFAULT_REFRESH_PATH, DEFAULT_TENANT_HEADER};
pub use request::{ApiRequest, ApiResponse};
pub use state::CallState;
pub use tokens::{decode_tokens, TokenPair};
pub use transport::{ReqwestTransport, Transport};

// Re-exported so callers can build requests without a direct reqwest dependency
pub use reqwest::{header, Method, StatusCode};

pub type Result<T> = std::result::Result<T, ClientError>;
