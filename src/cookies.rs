//! Cookie adapter bridging the identity provider's session storage and the HTTP cycle
//!
//! The provider never touches the request or the response directly. It reads
//! the incoming cookies and queues cookies to write through a [`CookieAdapter`]
//! that the handler builds for each request.

use actix_web::cookie::{time::Duration, Cookie, SameSite};
use actix_web::http::header;
use actix_web::HttpRequest;

use crate::settings::DEFAULT_COOKIE_MAX_AGE_SECONDS;

/// A cookie as read from the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestCookie {
    pub name: String,
    pub value: String,
}

/// Attributes a writer may set explicitly; `None` means "use the adapter default"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieAttributes {
    pub path: Option<String>,
    pub domain: Option<String>,
    pub http_only: Option<bool>,
    pub same_site: Option<SameSite>,
    pub secure: Option<bool>,
    pub max_age_seconds: Option<i64>,
}

/// A cookie the provider wants persisted on the response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieToSet {
    pub name: String,
    pub value: String,
    pub attributes: CookieAttributes,
}

impl CookieToSet {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            attributes: CookieAttributes::default(),
        }
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: CookieAttributes) -> Self {
        self.attributes = attributes;
        self
    }
}

/// Read/write interface the identity provider uses to persist its session
pub trait CookieAdapter: Send {
    /// All cookies present on the incoming request
    fn read_cookies(&self) -> Vec<RequestCookie>;

    /// Queue cookies for the outgoing response
    fn write_cookies(&mut self, cookies: Vec<CookieToSet>);
}

/// Defaults applied to every written cookie unless the writer overrides them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieDefaults {
    pub path: String,
    pub http_only: bool,
    pub same_site: SameSite,
    pub secure: bool,
    pub max_age_seconds: i64,
}

impl Default for CookieDefaults {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            http_only: true,
            same_site: SameSite::Lax,
            secure: false,
            max_age_seconds: DEFAULT_COOKIE_MAX_AGE_SECONDS,
        }
    }
}

impl CookieDefaults {
    /// Build the response cookie, letting explicit attributes win over the defaults
    #[must_use]
    pub fn apply(&self, cookie: CookieToSet) -> Cookie<'static> {
        let CookieToSet {
            name,
            value,
            attributes,
        } = cookie;

        let mut builder = Cookie::build(name, value)
            .path(attributes.path.unwrap_or_else(|| self.path.clone()))
            .http_only(attributes.http_only.unwrap_or(self.http_only))
            .same_site(attributes.same_site.unwrap_or(self.same_site))
            .secure(attributes.secure.unwrap_or(self.secure))
            .max_age(Duration::seconds(
                attributes.max_age_seconds.unwrap_or(self.max_age_seconds),
            ));

        if let Some(domain) = attributes.domain {
            builder = builder.domain(domain);
        }

        builder.finish()
    }
}

/// Parse every cookie out of a raw `Cookie` header value
///
/// Malformed pairs are skipped rather than failing the whole header.
#[must_use]
pub fn read_cookies(header_value: &str) -> Vec<RequestCookie> {
    header_value
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| Cookie::parse(pair.to_string()).ok())
        .map(|cookie| RequestCookie {
            name: cookie.name().to_string(),
            value: cookie.value().to_string(),
        })
        .collect()
}

/// Cookie adapter for one actix request/response pair
///
/// Cookies written through it are collected and attached by the handler when
/// it builds the response.
#[derive(Debug, Clone)]
pub struct ResponseCookies {
    incoming: Vec<RequestCookie>,
    outgoing: Vec<Cookie<'static>>,
    defaults: CookieDefaults,
}

impl ResponseCookies {
    #[must_use]
    pub fn new(incoming: Vec<RequestCookie>, defaults: CookieDefaults) -> Self {
        Self {
            incoming,
            outgoing: Vec::new(),
            defaults,
        }
    }

    /// Capture all `Cookie` headers from the request
    #[must_use]
    pub fn from_request(req: &HttpRequest, defaults: CookieDefaults) -> Self {
        let incoming = req
            .headers()
            .get_all(header::COOKIE)
            .filter_map(|value| value.to_str().ok())
            .flat_map(read_cookies)
            .collect();
        Self::new(incoming, defaults)
    }

    /// Cookies queued so far, with defaults applied
    #[must_use]
    pub fn pending(&self) -> &[Cookie<'static>] {
        &self.outgoing
    }

    #[must_use]
    pub fn into_cookies(self) -> Vec<Cookie<'static>> {
        self.outgoing
    }
}

impl CookieAdapter for ResponseCookies {
    fn read_cookies(&self) -> Vec<RequestCookie> {
        self.incoming.clone()
    }

    fn write_cookies(&mut self, cookies: Vec<CookieToSet>) {
        for cookie in cookies {
            log::debug!("Queueing cookie '{}' for response", cookie.name);
            // A later write for the same name replaces the earlier one
            self.outgoing.retain(|existing| existing.name() != cookie.name);
            self.outgoing.push(self.defaults.apply(cookie));
        }
    }
}
