//! Error taxonomy for the login endpoint
//!
//! Every variant is terminal for the request. [`LoginError`] implements
//! [`ResponseError`] so handlers can return it directly and actix renders the
//! JSON envelope with the matching status code.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;

pub const CONFIGURATION_MISSING_MESSAGE: &str =
    "Server configuration error - Supabase credentials not found";
pub const INVALID_BODY_MESSAGE: &str = "Invalid request body";
pub const INVALID_BODY_DETAILS: &str = "Could not parse JSON";
pub const MISSING_CREDENTIALS_MESSAGE: &str = "Email and password are required";
pub const NO_SESSION_MESSAGE: &str = "No session created";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";
pub const UNKNOWN_ERROR_DETAILS: &str = "Unknown error";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    /// Provider URL or public key was not configured
    #[error("Server configuration error - Supabase credentials not found")]
    ConfigurationMissing,

    /// Body was non-empty and could not be parsed as JSON
    #[error("Invalid request body: Could not parse JSON")]
    MalformedRequestBody,

    /// `email` or `password` missing or falsy
    #[error("Email and password are required")]
    ValidationFailure,

    /// Provider refused the credentials; carries the provider's message
    #[error("{0}")]
    AuthenticationRejected(String),

    /// Provider reported success without issuing a session
    #[error("No session created")]
    SessionAbsent,

    /// Anything else, e.g. the provider could not be reached
    #[error("Internal server error: {}", .0.as_deref().unwrap_or(UNKNOWN_ERROR_DETAILS))]
    Unhandled(Option<String>),
}

impl LoginError {
    /// Convenience constructor for the catch-all variant
    #[must_use]
    pub fn unhandled(details: impl Into<String>) -> Self {
        let details = details.into();
        if details.is_empty() {
            Self::Unhandled(None)
        } else {
            Self::Unhandled(Some(details))
        }
    }

    /// JSON body sent to the caller
    #[must_use]
    pub fn body(&self) -> serde_json::Value {
        match self {
            Self::ConfigurationMissing => json!({ "error": CONFIGURATION_MISSING_MESSAGE }),
            Self::MalformedRequestBody => json!({
                "error": INVALID_BODY_MESSAGE,
                "details": INVALID_BODY_DETAILS,
            }),
            Self::ValidationFailure => json!({ "error": MISSING_CREDENTIALS_MESSAGE }),
            Self::AuthenticationRejected(message) => json!({ "error": message }),
            Self::SessionAbsent => json!({ "error": NO_SESSION_MESSAGE }),
            Self::Unhandled(details) => json!({
                "error": INTERNAL_ERROR_MESSAGE,
                "details": details.as_deref().unwrap_or(UNKNOWN_ERROR_DETAILS),
            }),
        }
    }
}

impl ResponseError for LoginError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MalformedRequestBody | Self::ValidationFailure => StatusCode::BAD_REQUEST,
            Self::AuthenticationRejected(_) => StatusCode::UNAUTHORIZED,
            Self::ConfigurationMissing | Self::SessionAbsent | Self::Unhandled(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self.body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            LoginError::ConfigurationMissing.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            LoginError::MalformedRequestBody.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LoginError::ValidationFailure.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            LoginError::AuthenticationRejected("nope".to_string()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            LoginError::SessionAbsent.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            LoginError::Unhandled(None).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_bodies_match_envelope() {
        assert_eq!(
            LoginError::MalformedRequestBody.body(),
            json!({ "error": "Invalid request body", "details": "Could not parse JSON" })
        );
        assert_eq!(
            LoginError::AuthenticationRejected("Invalid login credentials".to_string()).body(),
            json!({ "error": "Invalid login credentials" })
        );
        assert_eq!(
            LoginError::ConfigurationMissing.body(),
            json!({ "error": "Server configuration error - Supabase credentials not found" })
        );
    }

    #[test]
    fn test_unhandled_falls_back_to_unknown_error() {
        assert_eq!(
            LoginError::unhandled("").body(),
            json!({ "error": "Internal server error", "details": "Unknown error" })
        );
        assert_eq!(
            LoginError::unhandled("connection refused").body(),
            json!({ "error": "Internal server error", "details": "connection refused" })
        );
        assert_eq!(
            LoginError::unhandled("connection refused").to_string(),
            "Internal server error: connection refused"
        );
    }
}
