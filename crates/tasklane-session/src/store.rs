//! Session Store
//!
//! Reads and writes the session across the two storage backends.
//! Reads consult the session-scoped backend first, then the durable one.
//! For each backend the primary key wins over its legacy alias.

use std::sync::Arc;

use tasklane_storage::KeyValueStore;

use crate::error::SessionError;
use crate::session::{Persistence, Session};
use crate::Result;

/// A logical storage key and the alias older builds wrote it under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageKey {
    pub primary: &'static str,
    pub legacy: Option<&'static str>,
}

impl StorageKey {
    fn names(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.primary).chain(self.legacy)
    }
}

pub const ACCESS_TOKEN_KEY: StorageKey = StorageKey {
    primary: "accessToken",
    legacy: Some("token"),
};

pub const TENANT_ID_KEY: StorageKey = StorageKey {
    primary: "tenantId",
    legacy: Some("tenant_id"),
};

pub const REFRESH_TOKEN_KEY: StorageKey = StorageKey {
    primary: "refreshToken",
    legacy: None,
};

const ALL_KEYS: [StorageKey; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TENANT_ID_KEY];

#[derive(Clone)]
pub struct SessionStore {
    durable: Arc<dyn KeyValueStore>,
    scoped: Arc<dyn KeyValueStore>,
    /// Used when no session is stored yet
    default_persistence: Persistence,
}

impl SessionStore {
    pub fn new(
        durable: Arc<dyn KeyValueStore>,
        scoped: Arc<dyn KeyValueStore>,
        default_persistence: Persistence,
    ) -> Self {
        Self {
            durable,
            scoped,
            default_persistence,
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY)
    }

    pub fn tenant_id(&self) -> Option<String> {
        self.read(TENANT_ID_KEY)
    }

    /// Current session, present only when an access token is stored
    pub fn load(&self) -> Option<Session> {
        let access_token = self.access_token()?;

        Some(Session {
            access_token,
            refresh_token: self.refresh_token(),
            tenant_id: self.tenant_id(),
        })
    }

    /// Backend currently holding the session
    pub fn persistence(&self) -> Persistence {
        if self.read_backend(self.scoped.as_ref(), ACCESS_TOKEN_KEY).is_some() {
            Persistence::SessionScoped
        } else if self.read_backend(self.durable.as_ref(), ACCESS_TOKEN_KEY).is_some() {
            Persistence::Durable
        } else {
            self.default_persistence
        }
    }

    /// Replace the stored session. A tenant already selected is kept when the
    /// new session carries none.
    pub fn save(&self, session: &Session, persistence: Persistence) -> Result<()> {
        if session.access_token.is_empty() {
            return Err(SessionError::EmptyAccessToken);
        }

        let tenant_id = session.tenant_id.clone().or_else(|| self.tenant_id());

        self.clear();

        let backend = self.backend(persistence);
        self.write(backend, ACCESS_TOKEN_KEY, &session.access_token);
        if let Some(refresh_token) = session.refresh_token.as_deref() {
            self.write(backend, REFRESH_TOKEN_KEY, refresh_token);
        }
        if let Some(tenant_id) = tenant_id.as_deref() {
            self.write(backend, TENANT_ID_KEY, tenant_id);
        }

        tracing::debug!(persistence = %persistence, "Saved session");

        Ok(())
    }

    /// Store tokens from a refresh in the backend that holds the session
    pub fn store_tokens(&self, access_token: &str, refresh_token: Option<&str>) -> Result<()> {
        if access_token.is_empty() {
            return Err(SessionError::EmptyAccessToken);
        }

        let backend = self.backend(self.persistence());
        self.write(backend, ACCESS_TOKEN_KEY, access_token);
        if let Some(refresh_token) = refresh_token {
            self.write(backend, REFRESH_TOKEN_KEY, refresh_token);
        }

        Ok(())
    }

    pub fn set_tenant(&self, tenant_id: &str) {
        let backend = self.backend(self.persistence());
        self.write(backend, TENANT_ID_KEY, tenant_id);
    }

    /// Remove every session key, aliases included, from both backends
    pub fn clear(&self) {
        let names: Vec<&str> = ALL_KEYS.iter().flat_map(StorageKey::names).collect();
        for backend in [self.scoped.as_ref(), self.durable.as_ref()] {
            if let Err(e) = backend.remove_many(&names) {
                tracing::warn!(error = %e, "Failed to remove session keys");
            }
        }
    }

    fn backend(&self, persistence: Persistence) -> &dyn KeyValueStore {
        match persistence {
            Persistence::Durable => self.durable.as_ref(),
            Persistence::SessionScoped => self.scoped.as_ref(),
        }
    }

    fn read(&self, key: StorageKey) -> Option<String> {
        self.read_backend(self.scoped.as_ref(), key)
            .or_else(|| self.read_backend(self.durable.as_ref(), key))
    }

    fn read_backend(&self, backend: &dyn KeyValueStore, key: StorageKey) -> Option<String> {
        key.names().find_map(|name| match backend.get(name) {
            Ok(Some(value)) if !value.is_empty() => Some(value),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(key = name, error = %e, "Failed to read session key");
                None
            }
        })
    }

    /// Writes the primary key and mirrors it under the legacy alias
    fn write(&self, backend: &dyn KeyValueStore, key: StorageKey, value: &str) {
        let entries: Vec<(&str, &str)> = key.names().map(|name| (name, value)).collect();
        if let Err(e) = backend.set_many(&entries) {
            tracing::warn!(key = key.primary, error = %e, "Failed to write session key");
        }
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("default_persistence", &self.default_persistence)
            .finish_non_exhaustive()
    }
}
