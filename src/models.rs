use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LoginError;
use crate::provider::PasswordCredentials;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Successful login response body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub user: LoginUser,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginUser {
    pub email: Option<String>,
}

impl LoginResponse {
    #[must_use]
    pub fn success(email: Option<String>) -> Self {
        Self {
            success: true,
            message: "Login successful".to_string(),
            user: LoginUser { email },
        }
    }
}

/// Parse the raw login body into credentials
///
/// An empty body is treated as `{}`. Field values must be non-empty strings;
/// anything falsy or non-string counts as missing.
///
/// # Errors
///
/// - [`LoginError::MalformedRequestBody`] if a non-empty body is not UTF-8 JSON
/// - [`LoginError::ValidationFailure`] if `email` or `password` is missing
pub fn parse_credentials(body: &[u8]) -> Result<PasswordCredentials, LoginError> {
    let value = if body.is_empty() {
        Value::Object(serde_json::Map::new())
    } else {
        let text = std::str::from_utf8(body).map_err(|_| LoginError::MalformedRequestBody)?;
        serde_json::from_str::<Value>(text).map_err(|e| {
            log::debug!("Login body is not valid JSON: {e}");
            LoginError::MalformedRequestBody
        })?
    };

    let email = required_string(&value, "email");
    let password = required_string(&value, "password");

    match (email, password) {
        (Some(email), Some(password)) => Ok(PasswordCredentials::new(email, password)),
        _ => Err(LoginError::ValidationFailure),
    }
}

fn required_string<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
}
