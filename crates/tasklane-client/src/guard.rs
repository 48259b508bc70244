//! Session Guard
//!
//! Wraps every call with tenant and bearer headers and recovers from an
//! expired access token:
//! - the first call to see a 401 performs a single refresh
//! - calls that see a 401 meanwhile wait in a FIFO queue
//! - every waiter and the refreshing call are replayed once with the new token
//! - when the session cannot be recovered it is cleared and `auth:logout` fires

use parking_lot::{Mutex, RwLock};
use reqwest::header::HeaderName;
use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;

use tasklane_session::SessionStore;

use crate::error::{AuthFailure, ClientError};
use crate::events::{LogoutBus, LogoutReason};
use crate::queue::{PendingQueue, RefreshResult};
use crate::request::{ApiRequest, ApiResponse};
use crate::state::{CallState, CallTrace};
use crate::tokens::{decode_tokens, TokenPair};
use crate::transport::Transport;
use crate::Result;

pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";
pub const DEFAULT_TENANT_HEADER: &str = "x-tenant-id";

#[derive(Debug, Clone)]
pub struct GuardSettings {
    pub refresh_path: String,
    pub tenant_header: HeaderName,
}

impl GuardSettings {
    pub fn new(refresh_path: &str, tenant_header: &str) -> Result<Self> {
        let tenant_header = HeaderName::from_bytes(tenant_header.as_bytes())
            .map_err(|_| ClientError::InvalidHeader(tenant_header.to_string()))?;

        Ok(Self {
            refresh_path: normalize_path(refresh_path),
            tenant_header,
        })
    }
}

impl Default for GuardSettings {
    fn default() -> Self {
        Self {
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            tenant_header: HeaderName::from_static(DEFAULT_TENANT_HEADER),
        }
    }
}

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    queue: PendingQueue,
}

struct GuardInner {
    store: SessionStore,
    transport: Arc<dyn Transport>,
    settings: GuardSettings,
    /// Bearer used when the store has no token, updated after each refresh
    default_token: RwLock<Option<String>>,
    refresh: Mutex<RefreshState>,
    logout: LogoutBus,
}

impl GuardInner {
    /// Resolve every waiter and clear the in-flight flag
    fn complete_refresh(&self, outcome: &RefreshResult) {
        let mut state = self.refresh.lock();
        let delivered = state.queue.drain(outcome);
        state.in_flight = false;

        tracing::debug!(
            waiters = delivered,
            ok = outcome.is_ok(),
            "Refresh concluded"
        );
    }
}

/// Clears the in-flight flag even when the refreshing call is dropped
struct RefreshTicket<'a> {
    inner: &'a GuardInner,
    finished: bool,
}

impl<'a> RefreshTicket<'a> {
    fn new(inner: &'a GuardInner) -> Self {
        Self {
            inner,
            finished: false,
        }
    }

    fn finish(mut self, outcome: &RefreshResult) {
        self.finished = true;
        self.inner.complete_refresh(outcome);
    }
}

impl Drop for RefreshTicket<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::warn!("Refresh dropped before completing");
            self.inner.complete_refresh(&Err(AuthFailure::Abandoned));
        }
    }
}

#[derive(Clone)]
pub struct SessionGuard {
    inner: Arc<GuardInner>,
}

impl SessionGuard {
    pub fn new(store: SessionStore, transport: Arc<dyn Transport>, settings: GuardSettings) -> Self {
        Self {
            inner: Arc::new(GuardInner {
                store,
                transport,
                settings,
                default_token: RwLock::new(None),
                refresh: Mutex::new(RefreshState::default()),
                logout: LogoutBus::new(),
            }),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.inner.store
    }

    pub fn settings(&self) -> &GuardSettings {
        &self.inner.settings
    }

    pub fn logout_bus(&self) -> &LogoutBus {
        &self.inner.logout
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.inner.transport.as_ref()
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.refresh.lock().in_flight
    }

    /// Calls currently parked behind a refresh
    pub fn pending_len(&self) -> usize {
        self.inner.refresh.lock().queue.len()
    }

    pub fn default_token(&self) -> Option<String> {
        self.inner.default_token.read().clone()
    }

    pub(crate) fn set_default_token(&self, token: Option<String>) {
        *self.inner.default_token.write() = token;
    }

    pub fn is_refresh_request(&self, request: &ApiRequest) -> bool {
        normalize_path(&request.path) == self.inner.settings.refresh_path
    }

    /// Set the tenant header and, except for the refresh endpoint, the bearer
    /// header. Missing values leave the header out.
    pub fn attach(&self, request: &mut ApiRequest) {
        let settings = &self.inner.settings;

        if let Some(tenant_id) = self.inner.store.tenant_id() {
            if !request.set_header(&settings.tenant_header, &tenant_id) {
                tracing::warn!(path = %request.path, "Tenant id is not a valid header value");
            }
        }

        if self.is_refresh_request(request) {
            return;
        }

        let token = self
            .inner
            .store
            .access_token()
            .or_else(|| self.default_token());
        if let Some(token) = token {
            if !request.set_bearer(&token) {
                tracing::warn!(path = %request.path, "Access token is not a valid header value");
            }
        }
    }

    /// Attach credentials, send, and recover from an expired access token
    pub async fn execute(&self, mut request: ApiRequest) -> Result<ApiResponse> {
        let mut trace = CallTrace::new();

        trace.advance(CallState::AttachHeaders);
        self.attach(&mut request);

        trace.advance(CallState::Sent);
        let response = match self.inner.transport.send(&request).await {
            Ok(response) => response,
            Err(e) => {
                trace.advance(CallState::Failed);
                return Err(e.into());
            }
        };

        self.recover(trace, request, response).await
    }

    /// Handle the response to a request that was attached and sent elsewhere
    pub async fn handle_response(
        &self,
        request: ApiRequest,
        response: ApiResponse,
    ) -> Result<ApiResponse> {
        let mut trace = CallTrace::new();
        trace.advance(CallState::AttachHeaders);
        trace.advance(CallState::Sent);

        self.recover(trace, request, response).await
    }

    async fn recover(
        &self,
        mut trace: CallTrace,
        mut request: ApiRequest,
        response: ApiResponse,
    ) -> Result<ApiResponse> {
        if response.status != StatusCode::UNAUTHORIZED {
            return finish(&mut trace, response);
        }

        trace.advance(CallState::AuthFailure);

        if request.retried || self.is_refresh_request(&request) {
            tracing::debug!(
                call_id = %trace.id,
                path = %request.path,
                "Unauthorized after refresh; giving up"
            );
            trace.advance(CallState::Failed);
            return Err(ClientError::Unauthorized);
        }

        request.retried = true;

        let token = match self.obtain_token(&mut trace).await {
            Ok(token) => {
                trace.advance(CallState::RefreshOk);
                token
            }
            Err(failure) => {
                trace.advance(CallState::RefreshFail);
                trace.advance(CallState::Failed);
                return Err(failure.into());
            }
        };

        trace.advance(CallState::Replay);
        request.set_bearer(&token);

        tracing::debug!(call_id = %trace.id, path = %request.path, "Replaying request");

        let response = match self.inner.transport.send(&request).await {
            Ok(response) => response,
            Err(e) => {
                trace.advance(CallState::Failed);
                return Err(e.into());
            }
        };

        finish(&mut trace, response)
    }

    /// Join the refresh in flight or start one
    async fn obtain_token(&self, trace: &mut CallTrace) -> std::result::Result<String, AuthFailure> {
        let waiter = {
            let mut state = self.inner.refresh.lock();
            if state.in_flight {
                Some(state.queue.push(trace.id))
            } else {
                state.in_flight = true;
                None
            }
        };

        if let Some(rx) = waiter {
            trace.advance(CallState::RefreshWait);
            tracing::debug!(call_id = %trace.id, "Waiting for refresh in flight");
            return rx.await.unwrap_or(Err(AuthFailure::Abandoned));
        }

        trace.advance(CallState::RefreshStart);
        let ticket = RefreshTicket::new(&self.inner);

        let outcome = self.refresh().await.map(|pair| {
            if let Err(e) = self
                .inner
                .store
                .store_tokens(&pair.access_token, pair.refresh_token.as_deref())
            {
                tracing::warn!(error = %e, "Failed to store refreshed tokens");
            }
            self.set_default_token(Some(pair.access_token.clone()));
            pair.access_token
        });

        // Session cleared before the in-flight flag is released
        if let Err(failure) = &outcome {
            tracing::warn!(call_id = %trace.id, error = %failure, "Token refresh failed");
            if let Some(reason) = failure.logout_reason() {
                self.end_session(reason);
            }
        }

        ticket.finish(&outcome);

        outcome
    }

    /// Exchange the stored refresh token for new tokens. Exactly one network
    /// call, none when no refresh token is stored.
    async fn refresh(&self) -> std::result::Result<TokenPair, AuthFailure> {
        let Some(refresh_token) = self.inner.store.refresh_token() else {
            return Err(AuthFailure::MissingRefreshToken);
        };

        let mut request = ApiRequest::post(self.inner.settings.refresh_path.clone())
            .json(json!({ "refreshToken": refresh_token }));
        if let Some(tenant_id) = self.inner.store.tenant_id() {
            request.set_header(&self.inner.settings.tenant_header, &tenant_id);
        }

        let response = self
            .inner
            .transport
            .send(&request)
            .await
            .map_err(|e| AuthFailure::Unreachable(e.to_string()))?;

        if !response.is_success() {
            return Err(AuthFailure::Rejected(response.status.as_u16()));
        }

        let pair = decode_tokens(&response.body, Some(&refresh_token))?;

        tracing::info!(
            rotated_refresh = pair.refresh_token.as_deref() != Some(refresh_token.as_str()),
            "Access token refreshed"
        );

        Ok(pair)
    }

    /// Clear the stored session and notify subscribers
    pub fn end_session(&self, reason: LogoutReason) {
        self.inner.store.clear();
        self.set_default_token(None);
        self.inner.logout.emit(reason);
    }
}

fn finish(trace: &mut CallTrace, response: ApiResponse) -> Result<ApiResponse> {
    if response.is_success() {
        trace.advance(CallState::Success);
        return Ok(response);
    }

    trace.advance(CallState::Failed);

    if response.status == StatusCode::UNAUTHORIZED {
        Err(ClientError::Unauthorized)
    } else {
        Err(ClientError::Status {
            status: response.status,
            body: response.text(),
        })
    }
}

fn normalize_path(path: &str) -> String {
    let path = path.split('?').next().unwrap_or_default();
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}
