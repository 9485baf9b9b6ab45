//! Session persistence in cookies, in the layout Supabase's SSR helpers read
//!
//! The session is serialized to JSON, base64url-encoded behind a `base64-`
//! prefix, and stored under `sb-<project>-auth-token`. Values longer than
//! [`MAX_CHUNK_SIZE`] are split across `<key>.0`, `<key>.1`, ... cookies.

use base64::{engine::general_purpose, Engine as _};
use std::collections::HashSet;

use super::{ProviderError, Session};
use crate::cookies::{CookieAdapter, CookieAttributes, CookieToSet};

pub const MAX_CHUNK_SIZE: usize = 3180;
pub const BASE64_PREFIX: &str = "base64-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStorage {
    key: String,
}

impl SessionStorage {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    /// Storage key derived from the first DNS label of the provider host
    #[must_use]
    pub fn for_provider(url: &url::Url) -> Self {
        let project = url
            .host_str()
            .and_then(|host| host.split('.').next())
            .filter(|label| !label.is_empty())
            .unwrap_or("localhost");
        Self::new(format!("sb-{project}-auth-token"))
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether `name` is the storage key or one of its chunks
    #[must_use]
    pub fn owns(&self, name: &str) -> bool {
        name == self.key
            || name
                .strip_prefix(self.key.as_str())
                .and_then(|rest| rest.strip_prefix('.'))
                .is_some_and(|index| !index.is_empty() && index.parse::<u32>().is_ok())
    }

    /// Encode a session as a cookie value
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Storage`] if the session cannot be serialized
    pub fn encode(session: &Session) -> Result<String, ProviderError> {
        let json = serde_json::to_vec(session).map_err(|e| ProviderError::Storage(e.to_string()))?;
        Ok(format!(
            "{BASE64_PREFIX}{}",
            general_purpose::URL_SAFE_NO_PAD.encode(json)
        ))
    }

    /// Split an encoded value into `(cookie name, value)` pairs
    #[must_use]
    pub fn chunk(&self, value: &str) -> Vec<(String, String)> {
        if value.len() <= MAX_CHUNK_SIZE {
            return vec![(self.key.clone(), value.to_string())];
        }

        // Encoded values are ASCII, so byte chunks are valid UTF-8
        value
            .as_bytes()
            .chunks(MAX_CHUNK_SIZE)
            .enumerate()
            .map(|(index, part)| {
                (
                    format!("{}.{index}", self.key),
                    String::from_utf8_lossy(part).into_owned(),
                )
            })
            .collect()
    }

    /// Write `session` through the adapter and clear chunks left over from an older session
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Storage`] if the session cannot be serialized
    pub fn persist(
        &self,
        session: &Session,
        cookies: &mut dyn CookieAdapter,
    ) -> Result<(), ProviderError> {
        let encoded = Self::encode(session)?;
        let chunks = self.chunk(&encoded);
        let fresh: HashSet<&str> = chunks.iter().map(|(name, _)| name.as_str()).collect();

        let mut writes: Vec<CookieToSet> = cookies
            .read_cookies()
            .into_iter()
            .filter(|cookie| self.owns(&cookie.name) && !fresh.contains(cookie.name.as_str()))
            .map(|stale| {
                log::debug!("Clearing stale session cookie '{}'", stale.name);
                CookieToSet::new(stale.name, "").with_attributes(CookieAttributes {
                    max_age_seconds: Some(0),
                    ..CookieAttributes::default()
                })
            })
            .collect();

        log::debug!(
            "Persisting session under '{}' in {} cookie(s)",
            self.key,
            chunks.len()
        );
        writes.extend(
            chunks
                .into_iter()
                .map(|(name, value)| CookieToSet::new(name, value)),
        );

        cookies.write_cookies(writes);
        Ok(())
    }
}
