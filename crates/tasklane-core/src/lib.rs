//! Tasklane Core
//!
//! Central wiring for the Tasklane client: configuration, logging, storage
//! backends and the authenticated API client.

mod config;
mod error;
mod workspace;

pub use config::Config;
pub use error::CoreError;
pub use workspace::Workspace;

// Re-export core components
pub use tasklane_client::{
    ApiClient, ApiRequest, ApiResponse, AuthFailure, ClientError, Credentials, LogoutEvent,
    LogoutReason, SessionGuard, LOGOUT_EVENT,
};
pub use tasklane_session::{Persistence, Session, SessionStore};
pub use tasklane_storage::{Database, KeyValueStore, MemoryStore, StorageError};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
