#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

/// Version of the awards-auth application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cookies;
pub mod error;
pub mod handlers;
pub mod models;
pub mod provider;
pub mod settings;

// Test utilities, available to unit tests and to integration tests via the `testing` feature
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Re-export commonly used items
pub use error::LoginError;
pub use handlers::{configure_services, health, login, LoginService};
pub use provider::{GoTrueClient, IdentityProvider};
pub use settings::AppSettings;
