//! HTTP client for the GoTrue auth API behind Supabase

use async_trait::async_trait;
use chrono::Utc;
use reqwest::StatusCode;
use serde_json::Value;

use super::{IdentityProvider, PasswordCredentials, ProviderError, SessionStorage, SignInData, User};
use crate::cookies::CookieAdapter;
use crate::settings::ProviderConfig;

const TOKEN_PATH: &str = "auth/v1/token";

/// GoTrue password-grant client
///
/// Holds one pooled `reqwest::Client`; cheap to share behind `web::Data`.
#[derive(Debug, Clone)]
pub struct GoTrueClient {
    http: reqwest::Client,
    config: ProviderConfig,
    storage: SessionStorage,
}

impl GoTrueClient {
    /// Create a client for the configured provider
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("awards-auth/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_http_client(config, http))
    }

    #[must_use]
    pub fn with_http_client(config: ProviderConfig, http: reqwest::Client) -> Self {
        let storage = SessionStorage::for_provider(&config.url);
        Self {
            http,
            config,
            storage,
        }
    }

    #[must_use]
    pub fn storage(&self) -> &SessionStorage {
        &self.storage
    }

    /// `{base}/auth/v1/token?grant_type=password`, keeping any base path
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Decode`] if the joined URL does not parse
    pub fn password_grant_url(&self) -> Result<url::Url, ProviderError> {
        let base = self.config.url.as_str().trim_end_matches('/');
        let mut endpoint = url::Url::parse(&format!("{base}/{TOKEN_PATH}"))
            .map_err(|e| ProviderError::Decode(format!("invalid token endpoint: {e}")))?;
        endpoint
            .query_pairs_mut()
            .append_pair("grant_type", "password");
        Ok(endpoint)
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    async fn sign_in_with_password(
        &self,
        credentials: &PasswordCredentials,
        cookies: &mut dyn CookieAdapter,
    ) -> Result<SignInData, ProviderError> {
        let endpoint = self.password_grant_url()?;
        log::debug!("Requesting password grant from {endpoint}");

        let response = self
            .http
            .post(endpoint)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
            .json(credentials)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let error = parse_error_response(status, &body);
            log::debug!("Provider rejected password grant with status {status}");
            return Err(error);
        }

        let data = parse_token_response(&body)?;
        if let Some(session) = &data.session {
            self.storage.persist(session, cookies)?;
        }
        Ok(data)
    }

    fn provider_name(&self) -> &'static str {
        "gotrue"
    }
}

/// Map a non-2xx provider answer to [`ProviderError::Rejected`]
///
/// GoTrue has used several error shapes over time: `{code, error_code, msg}`,
/// `{error, error_description}` and `{message}`. The first non-empty message wins.
#[must_use]
pub fn parse_error_response(status: StatusCode, body: &str) -> ProviderError {
    let json: Option<Value> = serde_json::from_str(body).ok();
    let field = |name: &str| {
        json.as_ref()
            .and_then(|value| value.get(name))
            .and_then(Value::as_str)
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
    };

    let message = ["msg", "message", "error_description", "error"]
        .into_iter()
        .find_map(|name| field(name))
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));

    let code = field("error_code").or_else(|| {
        // Older servers put the machine code in `error` next to `error_description`
        field("error_description").and(field("error"))
    });

    ProviderError::Rejected {
        status: status.as_u16(),
        code,
        message,
    }
}

/// Interpret a 2xx password-grant body
///
/// # Errors
///
/// Returns [`ProviderError::Decode`] if the body is not JSON or a session/user
/// object in it has the wrong shape
pub fn parse_token_response(body: &str) -> Result<SignInData, ProviderError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    if value.get("access_token").and_then(Value::as_str).is_some() {
        let mut session: super::Session =
            serde_json::from_value(value).map_err(|e| ProviderError::Decode(e.to_string()))?;
        if session.expires_at.is_none() {
            session.expires_at = Some(Utc::now().timestamp() + session.expires_in);
        }
        return Ok(SignInData {
            user: Some(session.user.clone()),
            session: Some(session),
        });
    }

    // Some GoTrue versions return the bare user object when no session is issued
    let user = match value.get("user").filter(|user| !user.is_null()) {
        Some(user) => Some(decode_user(user.clone())?),
        None if value.get("id").is_some() => Some(decode_user(value.clone())?),
        None => None,
    };

    Ok(SignInData {
        user,
        session: None,
    })
}

fn decode_user(value: Value) -> Result<User, ProviderError> {
    serde_json::from_value(value).map_err(|e| ProviderError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(url: &str) -> GoTrueClient {
        GoTrueClient::with_http_client(
            ProviderConfig {
                url: url::Url::parse(url).unwrap(),
                anon_key: "anon".to_string(),
            },
            reqwest::Client::new(),
        )
    }

    #[test]
    fn test_password_grant_url() {
        assert_eq!(
            client("https://abcd.supabase.co").password_grant_url().unwrap().as_str(),
            "https://abcd.supabase.co/auth/v1/token?grant_type=password"
        );
        assert_eq!(
            client("http://localhost:9999/proxy/").password_grant_url().unwrap().as_str(),
            "http://localhost:9999/proxy/auth/v1/token?grant_type=password"
        );
    }

    #[test]
    fn test_storage_key_follows_host() {
        assert_eq!(
            client("https://abcd.supabase.co").storage().key(),
            "sb-abcd-auth-token"
        );
    }

    #[test]
    fn test_parse_error_msg_shape() {
        let error = parse_error_response(
            StatusCode::BAD_REQUEST,
            r#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#,
        );
        match error {
            ProviderError::Rejected {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code.as_deref(), Some("invalid_credentials"));
                assert_eq!(message, "Invalid login credentials");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_oauth_shape() {
        let error = parse_error_response(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"Email not confirmed"}"#,
        );
        match error {
            ProviderError::Rejected { code, message, .. } => {
                assert_eq!(code.as_deref(), Some("invalid_grant"));
                assert_eq!(message, "Email not confirmed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_message_is_verbatim() {
        let error = parse_error_response(
            StatusCode::BAD_REQUEST,
            r#"{"msg":"  ","message":" Email not confirmed. "}"#,
        );
        assert_eq!(error.to_string(), " Email not confirmed. ");
    }

    #[test]
    fn test_parse_error_non_json_uses_reason_phrase() {
        let error = parse_error_response(StatusCode::BAD_GATEWAY, "<html>upstream down</html>");
        assert_eq!(error.to_string(), "Bad Gateway");
    }

    #[test]
    fn test_parse_token_response_with_session() {
        let body = json!({
            "access_token": "at",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "rt",
            "user": { "id": "u1", "email": "user@example.com" }
        })
        .to_string();

        let before = Utc::now().timestamp();
        let data = parse_token_response(&body).unwrap();
        let session = data.session.expect("session");
        assert_eq!(data.user.and_then(|u| u.email).as_deref(), Some("user@example.com"));
        let expires_at = session.expires_at.expect("expires_at filled in");
        assert!(expires_at >= before + 3600);
    }

    #[test]
    fn test_parse_token_response_keeps_expires_at() {
        let body = json!({
            "access_token": "at",
            "expires_in": 3600,
            "expires_at": 1_700_000_000,
            "refresh_token": "rt",
            "user": { "id": "u1", "email": "user@example.com" }
        })
        .to_string();

        let data = parse_token_response(&body).unwrap();
        assert_eq!(data.session.unwrap().expires_at, Some(1_700_000_000));
    }

    #[test]
    fn test_parse_token_response_without_session() {
        let data = parse_token_response(r#"{"user":{"id":"u1","email":"a@b.c"},"session":null}"#)
            .unwrap();
        assert!(data.session.is_none());
        assert_eq!(data.user.unwrap().id, "u1");

        let bare_user = parse_token_response(r#"{"id":"u2","email":"a@b.c"}"#).unwrap();
        assert!(bare_user.session.is_none());
        assert_eq!(bare_user.user.unwrap().id, "u2");

        let empty = parse_token_response("{}").unwrap();
        assert_eq!(empty, SignInData::default());
    }

    #[test]
    fn test_parse_token_response_rejects_garbage() {
        assert!(matches!(
            parse_token_response("not json"),
            Err(ProviderError::Decode(_))
        ));
    }
}
