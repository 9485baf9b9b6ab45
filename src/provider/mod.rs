//! Identity provider abstraction
//!
//! The hosted auth service verifies credentials and issues sessions. This
//! module defines the contract the login handler depends on
//! ([`IdentityProvider`]) and the GoTrue/Supabase implementation of it.

pub mod gotrue;
pub mod storage;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::cookies::CookieAdapter;

pub use gotrue::GoTrueClient;
pub use storage::SessionStorage;

/// Email/password pair forwarded to the provider
#[derive(Clone, Serialize, PartialEq, Eq)]
pub struct PasswordCredentials {
    pub email: String,
    pub password: String,
}

impl PasswordCredentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Verified user as reported by the provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Session issued by the provider after a successful password grant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub refresh_token: String,
    pub user: User,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Result of a password sign-in that the provider did not reject
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignInData {
    pub user: Option<User>,
    pub session: Option<Session>,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider answered and refused the request
    #[error("{message}")]
    Rejected {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// The provider could not be reached or the exchange broke off
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with something that is not a recognizable auth response
    #[error("Unexpected response from identity provider: {0}")]
    Decode(String),

    /// The issued session could not be written to cookies
    #[error("Failed to persist session: {0}")]
    Storage(String),
}

/// Password-based identity provider
///
/// Implementations persist the issued session through `cookies` before returning.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify `credentials` with the provider
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Rejected`] when the provider refuses the credentials,
    /// and the other variants when the exchange itself fails.
    async fn sign_in_with_password(
        &self,
        credentials: &PasswordCredentials,
        cookies: &mut dyn CookieAdapter,
    ) -> Result<SignInData, ProviderError>;

    /// Name used in logs
    fn provider_name(&self) -> &'static str;
}
