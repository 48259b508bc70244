//! Session data structure

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Short-lived bearer credential
    pub access_token: String,
    /// Longer-lived credential exchanged for a new access token
    pub refresh_token: Option<String>,
    /// Customer/organization scope sent on every request
    pub tenant_id: Option<String>,
}

impl Session {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            tenant_id: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Which backend holds the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persistence {
    /// Survives restarts
    #[default]
    Durable,
    /// Dropped when the process exits
    SessionScoped,
}

impl Persistence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Persistence::Durable => "durable",
            Persistence::SessionScoped => "session_scoped",
        }
    }
}

impl std::fmt::Display for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Persistence {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "durable" => Ok(Persistence::Durable),
            "session_scoped" | "session" => Ok(Persistence::SessionScoped),
            _ => Err(SessionError::UnknownPersistence(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let session = Session::new("T1").with_refresh_token("R1").with_tenant("acme");
        assert_eq!(session.access_token, "T1");
        assert_eq!(session.refresh_token.as_deref(), Some("R1"));
        assert_eq!(session.tenant_id.as_deref(), Some("acme"));
        assert!(session.has_refresh_token());
    }

    #[test]
    fn test_empty_refresh_token_does_not_count() {
        let session = Session::new("T1").with_refresh_token("");
        assert!(!session.has_refresh_token());
    }

    #[test]
    fn test_serializes_camel_case() {
        let session = Session::new("T1").with_tenant("acme");
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["accessToken"], "T1");
        assert_eq!(json["tenantId"], "acme");
        assert!(json["refreshToken"].is_null());
    }

    #[test]
    fn test_persistence_parse() {
        assert_eq!("durable".parse::<Persistence>(), Ok(Persistence::Durable));
        assert_eq!(
            "Session".parse::<Persistence>(),
            Ok(Persistence::SessionScoped)
        );
        assert_eq!(
            "disk".parse::<Persistence>(),
            Err(SessionError::UnknownPersistence("disk".to_string()))
        );
    }
}
