//! Mock identity provider for isolated handler tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::cookies::{CookieAdapter, CookieAttributes, CookieToSet};
use crate::provider::{
    IdentityProvider, PasswordCredentials, ProviderError, SessionStorage, SignInData,
};

use super::constants::{TEST_PASSWORD, TEST_STORAGE_KEY};
use super::fixtures::TestFixtures;

/// What the mock answers for a password sign-in
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Accept only `password` and issue a fresh session; otherwise reject like GoTrue does
    Accept { password: String },
    /// Accept but return no session
    NoSession,
    /// Reject every attempt with this message
    Reject { status: u16, message: String },
    /// Fail as if the provider answered with garbage
    Fail(String),
}

/// Identity provider double that records calls and persists sessions like the real client
pub struct MockIdentityProvider {
    outcome: MockOutcome,
    storage: SessionStorage,
    calls: AtomicUsize,
    seen: Mutex<Vec<PasswordCredentials>>,
    extra_cookie: Option<CookieToSet>,
}

impl MockIdentityProvider {
    #[must_use]
    pub fn new(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            storage: SessionStorage::new(TEST_STORAGE_KEY),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            extra_cookie: None,
        }
    }

    /// Accepts [`TEST_PASSWORD`] for any email
    #[must_use]
    pub fn accepting() -> Self {
        Self::new(MockOutcome::Accept {
            password: TEST_PASSWORD.to_string(),
        })
    }

    #[must_use]
    pub fn rejecting(message: &str) -> Self {
        Self::new(MockOutcome::Reject {
            status: 400,
            message: message.to_string(),
        })
    }

    /// Also write `cookie` on success, e.g. to test attribute overrides
    #[must_use]
    pub fn with_extra_cookie(mut self, name: &str, value: &str, attributes: CookieAttributes) -> Self {
        self.extra_cookie = Some(CookieToSet::new(name, value).with_attributes(attributes));
        self
    }

    /// Number of sign-in attempts received
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Credentials received so far, in order
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned
    #[must_use]
    pub fn seen(&self) -> Vec<PasswordCredentials> {
        self.seen.lock().expect("mock lock poisoned").clone()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn sign_in_with_password(
        &self,
        credentials: &PasswordCredentials,
        cookies: &mut dyn CookieAdapter,
    ) -> Result<SignInData, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.seen
            .lock()
            .expect("mock lock poisoned")
            .push(credentials.clone());

        match &self.outcome {
            MockOutcome::Accept { password } if *password == credentials.password => {
                let session = TestFixtures::session_with_token(
                    &credentials.email,
                    &format!("access-token-{call}"),
                );
                self.storage.persist(&session, cookies)?;
                if let Some(extra) = &self.extra_cookie {
                    cookies.write_cookies(vec![extra.clone()]);
                }
                Ok(SignInData {
                    user: Some(session.user.clone()),
                    session: Some(session),
                })
            }
            MockOutcome::Accept { .. } => Err(ProviderError::Rejected {
                status: 400,
                code: Some("invalid_credentials".to_string()),
                message: super::constants::INVALID_CREDENTIALS_MESSAGE.to_string(),
            }),
            MockOutcome::NoSession => Ok(SignInData {
                user: Some(TestFixtures::user(&credentials.email)),
                session: None,
            }),
            MockOutcome::Reject { status, message } => Err(ProviderError::Rejected {
                status: *status,
                code: None,
                message: message.clone(),
            }),
            MockOutcome::Fail(message) => Err(ProviderError::Decode(message.clone())),
        }
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
