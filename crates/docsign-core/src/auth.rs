//! Identity verification collaborator
//!
//! The signing workspace never sees credentials; it is created from an
//! already-authenticated [`AuthSession`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Opaque bearer token identifying an authenticated session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub username: String,
    pub token: SessionToken,
    pub issued_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            token: SessionToken::generate(),
            issued_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str)
        -> Result<AuthSession, AuthError>;
}

/// Checks against a single configured username/password pair
#[derive(Debug, Clone)]
pub struct StaticAuthenticator {
    credentials: Option<(String, String)>,
}

impl StaticAuthenticator {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            credentials: Some((username.to_string(), password.to_string())),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        let credentials = match (&config.username, &config.password) {
            (Some(u), Some(p)) if !u.is_empty() => Some((u.clone(), p.clone())),
            _ => None,
        };
        Self { credentials }
    }
}

#[async_trait]
impl Authenticator for StaticAuthenticator {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let (expected_user, expected_password) =
            self.credentials.as_ref().ok_or(AuthError::NotConfigured)?;

        if username != expected_user.as_str() || password != expected_password.as_str() {
            tracing::warn!(username, "Authentication failed");
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(username, "Authenticated");
        Ok(AuthSession::new(username))
    }
}
