// Login handler: forwards credentials to the identity provider
use actix_web::{web, HttpRequest, HttpResponse};
use log::{error, info, warn};
use std::sync::Arc;

use crate::cookies::{CookieDefaults, ResponseCookies};
use crate::error::LoginError;
use crate::models::{parse_credentials, LoginResponse};
use crate::provider::{GoTrueClient, IdentityProvider, ProviderError};
use crate::settings::AppSettings;

/// Largest login body accepted; anything bigger cannot be a credential pair
pub const MAX_BODY_BYTES: usize = 256 * 1024;

/// Shared state for the login endpoint
///
/// The provider is resolved once at startup. When configuration is missing the
/// service still starts and every login answers with the configuration error.
#[derive(Clone)]
pub struct LoginService {
    provider: Option<Arc<dyn IdentityProvider>>,
    cookie_defaults: CookieDefaults,
}

impl LoginService {
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, cookie_defaults: CookieDefaults) -> Self {
        Self {
            provider: Some(provider),
            cookie_defaults,
        }
    }

    /// A service with no provider; every request fails with `ConfigurationMissing`
    #[must_use]
    pub fn unconfigured(cookie_defaults: CookieDefaults) -> Self {
        Self {
            provider: None,
            cookie_defaults,
        }
    }

    /// Validate provider settings and build the GoTrue client
    #[must_use]
    pub fn from_settings(settings: &AppSettings) -> Self {
        let cookie_defaults = settings.cookie_defaults();
        let config = match settings.provider_config() {
            Ok(config) => config,
            Err(e) => {
                warn!("{e}; login requests will be refused");
                return Self::unconfigured(cookie_defaults);
            }
        };

        match GoTrueClient::new(config) {
            Ok(client) => {
                info!(
                    "✅ Identity provider configured (session cookie '{}')",
                    client.storage().key()
                );
                Self::new(Arc::new(client), cookie_defaults)
            }
            Err(e) => {
                error!("Failed to build identity provider client: {e}");
                Self::unconfigured(cookie_defaults)
            }
        }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Run one login attempt and produce the response
    ///
    /// The body is read here, after the configuration check, so no request
    /// content can change the outcome for an unconfigured service.
    ///
    /// # Errors
    ///
    /// Returns the [`LoginError`] for whichever step failed first
    pub async fn login(
        &self,
        req: &HttpRequest,
        payload: web::Payload,
    ) -> Result<HttpResponse, LoginError> {
        let provider = self.provider.as_ref().ok_or_else(|| {
            error!("Login refused: provider URL or public key not configured");
            LoginError::ConfigurationMissing
        })?;

        let body = read_body(payload).await?;
        let credentials = parse_credentials(&body).inspect_err(|e| {
            warn!("Login request rejected: {e}");
        })?;

        let mut cookies = ResponseCookies::from_request(req, self.cookie_defaults.clone());

        let data = provider
            .sign_in_with_password(&credentials, &mut cookies)
            .await
            .map_err(|e| match e {
                ProviderError::Rejected {
                    status,
                    code,
                    message,
                } => {
                    warn!(
                        "Login failed for {}: {message} (status {status}, code {code:?})",
                        mask_email(&credentials.email)
                    );
                    LoginError::AuthenticationRejected(message)
                }
                other => {
                    error!(
                        "Login for {} failed talking to {}: {other}",
                        mask_email(&credentials.email),
                        provider.provider_name()
                    );
                    LoginError::unhandled(other.to_string())
                }
            })?;

        let Some(session) = data.session else {
            error!(
                "Provider accepted {} but issued no session",
                mask_email(&credentials.email)
            );
            return Err(LoginError::SessionAbsent);
        };

        let email = session.user.email;
        info!(
            "Login successful for {}",
            mask_email(email.as_deref().unwrap_or(&credentials.email))
        );

        let mut response = HttpResponse::Ok();
        for cookie in cookies.into_cookies() {
            response.cookie(cookie);
        }
        Ok(response.json(LoginResponse::success(email)))
    }
}

/// Email for log lines: first character of the local part, then the domain
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first: String = local.chars().take(1).collect();
            format!("{first}***@{domain}")
        }
        None => "***".to_string(),
    }
}

/// Collect the request body, treating oversized or broken payloads as unparseable
async fn read_body(payload: web::Payload) -> Result<web::Bytes, LoginError> {
    match payload.to_bytes_limited(MAX_BODY_BYTES).await {
        Ok(Ok(body)) => Ok(body),
        Ok(Err(e)) => {
            warn!("Failed to read login body: {e}");
            Err(LoginError::MalformedRequestBody)
        }
        Err(_) => {
            warn!("Login body exceeds {MAX_BODY_BYTES} bytes");
            Err(LoginError::MalformedRequestBody)
        }
    }
}

/// `POST /api/auth/login`
///
/// # Errors
///
/// Returns a [`LoginError`], rendered as the JSON error envelope
pub async fn login(
    req: HttpRequest,
    payload: web::Payload,
    service: web::Data<LoginService>,
) -> Result<HttpResponse, LoginError> {
    service.login(&req, payload).await
}

#[cfg(test)]
mod tests {
    use super::mask_email;

    #[test]
    fn test_mask_email_hides_local_part() {
        assert_eq!(mask_email("jane.doe@example.com"), "j***@example.com");
        assert_eq!(mask_email("@example.com"), "***@example.com");
        assert_eq!(mask_email("not-an-email"), "***");
        assert!(!mask_email("jane.doe@example.com").contains("jane.doe"));
    }
}
