//! Per-call State Machine
//!
//! ```text
//! Init → AttachHeaders → Sent → Success
//!                          ↓
//!                     AuthFailure ──(already retried)──→ Failed
//!                      ↓        ↓
//!              RefreshWait   RefreshStart
//!                      ↓        ↓
//!                RefreshOk | RefreshFail → Failed
//!                      ↓
//!                   Replay → Success | Failed
//! ```

use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Init,
    AttachHeaders,
    Sent,
    Success,
    AuthFailure,
    /// Parked behind a refresh started by another call
    RefreshWait,
    /// This call owns the refresh
    RefreshStart,
    RefreshOk,
    RefreshFail,
    Replay,
    Failed,
}

impl CallState {
    pub fn can_transition_to(&self, target: CallState) -> bool {
        use CallState::*;

        matches!(
            (self, target),
            (Init, AttachHeaders)
                | (AttachHeaders, Sent)
                | (Sent, Success)
                | (Sent, AuthFailure)
                // Transport errors and non-401 statuses
                | (Sent, Failed)
                | (AuthFailure, RefreshWait)
                | (AuthFailure, RefreshStart)
                | (AuthFailure, Failed)
                | (RefreshWait, RefreshOk)
                | (RefreshWait, RefreshFail)
                | (RefreshStart, RefreshOk)
                | (RefreshStart, RefreshFail)
                | (RefreshOk, Replay)
                | (RefreshFail, Failed)
                | (Replay, Success)
                | (Replay, Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CallState::Success | CallState::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CallState::Init => "init",
            CallState::AttachHeaders => "attach_headers",
            CallState::Sent => "sent",
            CallState::Success => "success",
            CallState::AuthFailure => "auth_failure",
            CallState::RefreshWait => "refresh_wait",
            CallState::RefreshStart => "refresh_start",
            CallState::RefreshOk => "refresh_ok",
            CallState::RefreshFail => "refresh_fail",
            CallState::Replay => "replay",
            CallState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for CallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks one call through the state machine and traces each step
#[derive(Debug)]
pub(crate) struct CallTrace {
    pub(crate) id: Uuid,
    state: CallState,
}

impl CallTrace {
    pub(crate) fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: CallState::Init,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> CallState {
        self.state
    }

    pub(crate) fn advance(&mut self, to: CallState) {
        debug_assert!(
            self.state.can_transition_to(to),
            "invalid call transition: {} -> {}",
            self.state,
            to
        );
        tracing::trace!(call_id = %self.id, from = %self.state, to = %to, "Call state");
        self.state = to;
    }
}
