//! Test fixtures providing pre-built test objects

use chrono::Utc;
use serde_json::{json, Map};
use std::sync::Arc;

use crate::cookies::CookieDefaults;
use crate::handlers::LoginService;
use crate::provider::{IdentityProvider, Session, User};
use crate::settings::AppSettings;

use super::constants::{TEST_ANON_KEY, TEST_PROVIDER_URL, TEST_USER_ID};

/// Central fixture provider for all test data
pub struct TestFixtures;

impl TestFixtures {
    /// A verified user with the given email
    #[must_use]
    pub fn user(email: &str) -> User {
        let mut extra = Map::new();
        extra.insert("aud".to_string(), json!("authenticated"));
        extra.insert("role".to_string(), json!("authenticated"));
        User {
            id: TEST_USER_ID.to_string(),
            email: Some(email.to_string()),
            extra,
        }
    }

    /// A freshly issued one-hour session for `email`
    #[must_use]
    pub fn session(email: &str) -> Session {
        Self::session_with_token(email, "test-access-token")
    }

    /// Session with a specific access token, for telling sessions apart
    #[must_use]
    pub fn session_with_token(email: &str, access_token: &str) -> Session {
        Session {
            access_token: access_token.to_string(),
            token_type: "bearer".to_string(),
            expires_in: 3600,
            expires_at: Some(Utc::now().timestamp() + 3600),
            refresh_token: format!("refresh-{access_token}"),
            user: Self::user(email),
            extra: Map::new(),
        }
    }

    /// GoTrue password-grant success body for `email`
    #[must_use]
    pub fn token_response(email: &str, access_token: &str) -> serde_json::Value {
        json!({
            "access_token": access_token,
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": format!("refresh-{access_token}"),
            "user": {
                "id": TEST_USER_ID,
                "aud": "authenticated",
                "role": "authenticated",
                "email": email,
            }
        })
    }

    /// Settings with the provider section filled in
    #[must_use]
    pub fn settings(provider_url: &str) -> AppSettings {
        let mut settings = AppSettings::default();
        settings.provider.url = Some(provider_url.to_string());
        settings.provider.anon_key = Some(TEST_ANON_KEY.to_string());
        settings
    }

    /// Settings pointing at the fixture provider host
    #[must_use]
    pub fn configured_settings() -> AppSettings {
        Self::settings(TEST_PROVIDER_URL)
    }

    /// Login service wired to an arbitrary provider with default cookie attributes
    #[must_use]
    pub fn login_service<P: IdentityProvider + 'static>(provider: P) -> LoginService {
        LoginService::new(Arc::new(provider), CookieDefaults::default())
    }

    /// Login service with no provider configured
    #[must_use]
    pub fn unconfigured_login_service() -> LoginService {
        LoginService::unconfigured(CookieDefaults::default())
    }
}
