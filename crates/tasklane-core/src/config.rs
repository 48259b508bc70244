//! Client configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use tasklane_client::{DEFAULT_LOGIN_PATH, DEFAULT_REFRESH_PATH};
use tasklane_session::Persistence;

use crate::error::CoreError;
use crate::Result;

const ENV_PREFIX: &str = "TASKLANE_";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the REST API
    pub api_base_url: String,
    /// Path to the durable session database
    pub database_path: PathBuf,
    /// Header carrying the tenant id
    pub tenant_header: String,
    /// Endpoint exchanging a refresh token for a new access token
    pub refresh_path: String,
    pub login_path: String,
    pub request_timeout_secs: u64,
    /// Where a new session is kept unless login says otherwise
    pub persistence: Persistence,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            database_path: data_dir.join("tasklane.db"),
            tenant_header: "X-Tenant-ID".to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            request_timeout_secs: 30,
            persistence: Persistence::Durable,
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("tasklane"))
            .unwrap_or_else(|| PathBuf::from(".tasklane"))
    }

    /// Defaults overridden by `TASKLANE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let mut config = Self::default();

        if let Some(url) = var("API_URL") {
            config.api_base_url = url;
        }
        if let Some(path) = var("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(header) = var("TENANT_HEADER") {
            config.tenant_header = header;
        }
        if let Some(path) = var("REFRESH_PATH") {
            config.refresh_path = path;
        }
        if let Some(path) = var("LOGIN_PATH") {
            config.login_path = path;
        }
        if let Some(secs) = var("REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = secs.parse().map_err(|_| {
                CoreError::Config(format!("REQUEST_TIMEOUT_SECS is not a number: {}", secs))
            })?;
        }
        if let Some(mode) = var("PERSISTENCE") {
            config.persistence = mode.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CoreError::Config(format!(
                "api_base_url must be http or https: {}",
                self.api_base_url
            )));
        }
        if self.tenant_header.trim().is_empty() {
            return Err(CoreError::Config("tenant_header cannot be empty".to_string()));
        }
        if self.refresh_path.trim().is_empty() || self.login_path.trim().is_empty() {
            return Err(CoreError::Config("auth paths cannot be empty".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::Config(
                "request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn base_url(&self) -> Result<Url> {
        Ok(Url::parse(&self.api_base_url)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}
