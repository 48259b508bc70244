//! Logout notifications
//!
//! The guard owns a broadcast channel. UI layers subscribe and route the
//! user to sign-in when an event arrives.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

pub const LOGOUT_EVENT: &str = "auth:logout";

const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    MissingRefreshToken,
    RefreshRejected,
    RefreshUnreachable,
    InvalidRefreshResponse,
    UserLogout,
}

impl LogoutReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogoutReason::MissingRefreshToken => "missing_refresh_token",
            LogoutReason::RefreshRejected => "refresh_rejected",
            LogoutReason::RefreshUnreachable => "refresh_unreachable",
            LogoutReason::InvalidRefreshResponse => "invalid_refresh_response",
            LogoutReason::UserLogout => "user_logout",
        }
    }
}

impl std::fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutEvent {
    pub reason: LogoutReason,
}

impl LogoutEvent {
    pub fn name(&self) -> &'static str {
        LOGOUT_EVENT
    }
}

#[derive(Debug, Clone)]
pub struct LogoutBus {
    tx: broadcast::Sender<LogoutEvent>,
}

impl LogoutBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogoutEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Returns the number of subscribers that received the event
    pub fn emit(&self, reason: LogoutReason) -> usize {
        let event = LogoutEvent { reason };
        tracing::info!(event = LOGOUT_EVENT, reason = %reason, "Session ended");
        // No subscribers is fine
        self.tx.send(event).unwrap_or(0)
    }
}

impl Default for LogoutBus {
    fn default() -> Self {
        Self::new()
    }
}
