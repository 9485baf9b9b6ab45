//! Testing utilities for awards-auth
//!
//! - [`fixtures`] - Pre-built test data (sessions, users, settings)
//! - [`mock`] - In-process identity provider with scripted outcomes
//! - [`fake_gotrue`] - A local HTTP server speaking the GoTrue password grant
//!
//! ## Usage
//!
//! ```rust,ignore
//! use awards_auth::testing::{fixtures::TestFixtures, mock::MockIdentityProvider};
//!
//! let provider = MockIdentityProvider::accepting();
//! let service = TestFixtures::login_service(provider);
//! ```

pub mod fake_gotrue;
pub mod fixtures;
pub mod mock;

pub use fixtures::TestFixtures;
pub use mock::{MockIdentityProvider, MockOutcome};

/// Common test constants
pub mod constants {
    /// Default test email address
    pub const TEST_EMAIL: &str = "test@example.com";

    /// Password the fake provider accepts
    pub const TEST_PASSWORD: &str = "correct-horse-battery-staple";

    /// Default test user ID
    pub const TEST_USER_ID: &str = "8d0fd2b3-9ca9-4ef0-a1c4-5d3a0c4b7e21";

    /// Provider host used in fixtures
    pub const TEST_PROVIDER_URL: &str = "https://abcdefgh.supabase.co";

    /// Session cookie name derived from [`TEST_PROVIDER_URL`]
    pub const TEST_STORAGE_KEY: &str = "sb-abcdefgh-auth-token";

    /// Public API key used in fixtures
    pub const TEST_ANON_KEY: &str = "test-anon-key";

    /// Message GoTrue returns for bad credentials
    pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid login credentials";
}
