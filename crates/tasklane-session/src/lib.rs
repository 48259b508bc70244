//! Tasklane Session Management
//!
//! - A Session is the access token, refresh token and tenant id of the signed-in user
//! - Sessions live in a durable or a session-scoped key-value backend
//! - Legacy key aliases are read and written for older installs
//! - Storage failures never surface; they read as "no value"

mod error;
mod session;
mod store;

pub use error::SessionError;
pub use session::{Persistence, Session};
pub use store::{SessionStore, StorageKey, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TENANT_ID_KEY};

pub type Result<T> = std::result::Result<T, SessionError>;
