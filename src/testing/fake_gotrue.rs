//! A throwaway GoTrue server for exercising the real HTTP client
//!
//! Binds to `127.0.0.1:0` on the current actix runtime and answers
//! `POST /auth/v1/token?grant_type=password` the way a Supabase project does.

use actix_web::dev::ServerHandle;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::constants::{INVALID_CREDENTIALS_MESSAGE, TEST_USER_ID};
use super::fixtures::TestFixtures;

/// One request as the fake server saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub apikey: Option<String>,
    pub authorization: Option<String>,
    pub grant_type: Option<String>,
    pub body: Value,
}

struct FakeState {
    email: String,
    password: String,
    issue_session: bool,
    issued: AtomicUsize,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct FakeGoTrue {
    url: String,
    handle: ServerHandle,
    state: web::Data<FakeState>,
}

impl FakeGoTrue {
    /// Start a server that accepts exactly `email`/`password`
    ///
    /// Must be called from within an actix runtime, e.g. an `#[actix_web::test]`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound
    pub fn start(email: &str, password: &str) -> std::io::Result<Self> {
        Self::spawn(email, password, true)
    }

    /// Start a server that accepts the credentials but never issues a session
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound
    pub fn start_without_sessions(email: &str, password: &str) -> std::io::Result<Self> {
        Self::spawn(email, password, false)
    }

    fn spawn(email: &str, password: &str, issue_session: bool) -> std::io::Result<Self> {
        let state = web::Data::new(FakeState {
            email: email.to_string(),
            password: password.to_string(),
            issue_session,
            issued: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        });

        let app_state = state.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(app_state.clone())
                .route("/auth/v1/token", web::post().to(token))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))?;

        let addr = server
            .addrs()
            .first()
            .copied()
            .ok_or_else(|| std::io::Error::other("fake GoTrue bound no address"))?;

        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Ok(Self {
            url: format!("http://{addr}"),
            handle,
            state,
        })
    }

    /// Base URL to configure as the provider URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Requests received so far
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state
            .requests
            .lock()
            .expect("fake GoTrue lock poisoned")
            .clone()
    }

    pub async fn stop(self) {
        self.handle.stop(true).await;
    }
}

fn header(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

async fn token(
    req: HttpRequest,
    query: web::Query<HashMap<String, String>>,
    body: web::Bytes,
    state: web::Data<FakeState>,
) -> HttpResponse {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let grant_type = query.get("grant_type").cloned();

    state
        .requests
        .lock()
        .expect("fake GoTrue lock poisoned")
        .push(RecordedRequest {
            apikey: header(&req, "apikey"),
            authorization: header(&req, "authorization"),
            grant_type: grant_type.clone(),
            body: body.clone(),
        });

    if grant_type.as_deref() != Some("password") {
        return HttpResponse::BadRequest().json(json!({
            "code": 400,
            "error_code": "validation_failed",
            "msg": "unsupported_grant_type"
        }));
    }

    let matches = body.get("email").and_then(Value::as_str) == Some(state.email.as_str())
        && body.get("password").and_then(Value::as_str) == Some(state.password.as_str());
    if !matches {
        return HttpResponse::BadRequest().json(json!({
            "code": 400,
            "error_code": "invalid_credentials",
            "msg": INVALID_CREDENTIALS_MESSAGE
        }));
    }

    if !state.issue_session {
        return HttpResponse::Ok().json(json!({
            "user": { "id": TEST_USER_ID, "email": state.email },
            "session": null
        }));
    }

    let issued = state.issued.fetch_add(1, Ordering::SeqCst) + 1;
    HttpResponse::Ok().json(TestFixtures::token_response(
        &state.email,
        &format!("fake-access-token-{issued}"),
    ))
}
