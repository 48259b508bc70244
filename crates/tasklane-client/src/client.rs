//! API Client
//!
//! The configured client the rest of the application uses. Every call goes
//! through the [`SessionGuard`].

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::broadcast;

use tasklane_session::{Persistence, Session, SessionStore};

use crate::error::ClientError;
use crate::events::{LogoutEvent, LogoutReason};
use crate::guard::SessionGuard;
use crate::request::{ApiRequest, ApiResponse};
use crate::tokens::decode_tokens;
use crate::Result;

pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    /// Where the resulting session is kept
    pub persistence: Persistence,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            persistence: Persistence::Durable,
        }
    }

    pub fn session_only(mut self) -> Self {
        self.persistence = Persistence::SessionScoped;
        self
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("persistence", &self.persistence)
            .finish()
    }
}

#[derive(Clone)]
pub struct ApiClient {
    guard: SessionGuard,
    login_path: String,
}

impl ApiClient {
    pub fn new(guard: SessionGuard) -> Self {
        Self {
            guard,
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }

    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    pub fn guard(&self) -> &SessionGuard {
        &self.guard
    }

    pub fn session_store(&self) -> &SessionStore {
        self.guard.store()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.guard.store().load()
    }

    pub fn subscribe_logout(&self) -> broadcast::Receiver<LogoutEvent> {
        self.guard.logout_bus().subscribe()
    }

    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.guard.execute(request).await
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.send(ApiRequest::post(path).json(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.send(ApiRequest::put(path).json(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> Result<ApiResponse> {
        self.send(ApiRequest::patch(path).json(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(ApiRequest::delete(path)).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        Ok(self.get(path).await?.json()?)
    }

    pub async fn post_json<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T> {
        Ok(self.post(path, body).await?.json()?)
    }

    /// Exchange credentials for a session and store it
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        let store = self.guard.store();

        let mut request = ApiRequest::post(self.login_path.clone()).json(json!({
            "email": credentials.email,
            "password": credentials.password,
        }));
        if let Some(tenant_id) = store.tenant_id() {
            request.set_header(&self.guard.settings().tenant_header, &tenant_id);
        }

        let response = self.guard.transport().send(&request).await?;
        if !response.is_success() {
            tracing::warn!(status = response.status.as_u16(), "Login rejected");
            return Err(ClientError::Status {
                status: response.status,
                body: response.text(),
            });
        }

        let pair = decode_tokens(&response.body, None)?;

        let session = Session {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            tenant_id: pair.tenant_id,
        };
        store.save(&session, credentials.persistence)?;
        self.guard
            .set_default_token(Some(session.access_token.clone()));

        tracing::info!(
            persistence = %credentials.persistence,
            has_refresh_token = session.has_refresh_token(),
            "Logged in"
        );

        Ok(store.load().unwrap_or(session))
    }

    /// End the session on the user's request
    pub fn logout(&self) {
        self.guard.end_session(LogoutReason::UserLogout);
    }

    pub fn select_tenant(&self, tenant_id: &str) {
        self.guard.store().set_tenant(tenant_id);
        tracing::info!(tenant_id = %tenant_id, "Selected tenant");
    }
}
