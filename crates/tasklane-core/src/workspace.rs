//! Client state container
//!
//! Owns the storage backends and the configured API client. Everything the
//! application does against the backend flows through here.

use std::sync::Arc;

use tasklane_client::{ApiClient, Credentials, GuardSettings, ReqwestTransport, SessionGuard};
use tasklane_session::{Persistence, Session, SessionStore};
use tasklane_storage::{Database, MemoryStore};

use crate::config::Config;
use crate::error::CoreError;
use crate::Result;

pub struct Workspace {
    config: Config,
    /// Durable backend
    db: Database,
    /// Session-scoped backend
    scoped: MemoryStore,
    client: ApiClient,
}

impl Workspace {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let db = Database::open(&config.database_path)?;
        Self::with_database(config, db)
    }

    /// Workspace whose durable backend lives in memory
    pub fn open_in_memory(config: Config) -> Result<Self> {
        config.validate()?;
        Self::with_database(config, Database::open_in_memory()?)
    }

    fn with_database(config: Config, db: Database) -> Result<Self> {
        let scoped = MemoryStore::new();
        let store = SessionStore::new(
            Arc::new(db.clone()),
            Arc::new(scoped.clone()),
            config.persistence,
        );

        let transport = ReqwestTransport::new(config.base_url()?, config.request_timeout())?;
        let settings = GuardSettings::new(&config.refresh_path, &config.tenant_header)?;
        let guard = SessionGuard::new(store, Arc::new(transport), settings);
        let client = ApiClient::new(guard).with_login_path(config.login_path.clone());

        tracing::info!(
            api_base_url = %config.api_base_url,
            persistence = %config.persistence,
            signed_in = client.current_session().is_some(),
            "Workspace ready"
        );

        Ok(Self {
            config,
            db,
            scoped,
            client,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn session_scoped_store(&self) -> &MemoryStore {
        &self.scoped
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn session(&self) -> Option<Session> {
        self.client.current_session()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    /// Sign in. `remember` keeps the session across restarts.
    pub async fn login(&self, email: &str, password: &str, remember: bool) -> Result<Session> {
        let mut credentials = Credentials::new(email, password);
        credentials.persistence = if remember {
            Persistence::Durable
        } else {
            Persistence::SessionScoped
        };

        Ok(self.client.login(&credentials).await?)
    }

    pub fn logout(&self) {
        self.client.logout();
    }

    pub fn select_tenant(&self, tenant_id: &str) -> Result<()> {
        let tenant_id = tenant_id.trim();
        if tenant_id.is_empty() {
            return Err(CoreError::EmptyTenant);
        }
        self.client.select_tenant(tenant_id);
        Ok(())
    }
}
