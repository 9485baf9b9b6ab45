// End-to-end tests: login endpoint -> GoTrue client -> fake GoTrue server
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use awards_auth::testing::constants::{TEST_EMAIL, TEST_PASSWORD};
use awards_auth::testing::fake_gotrue::FakeGoTrue;
use awards_auth::testing::TestFixtures;
use awards_auth::{configure_services, AppSettings, LoginService};
use serde_json::{json, Value};

fn login_request(body: &Value) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload(body.to_string())
}

fn session_cookies(resp: &actix_web::dev::ServiceResponse) -> Vec<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .filter_map(|value| value.to_str().ok())
        .filter(|value| value.starts_with("sb-127-auth-token"))
        .map(str::to_string)
        .collect()
}

#[actix_web::test]
async fn test_login_round_trip_through_provider() {
    let server = FakeGoTrue::start(TEST_EMAIL, TEST_PASSWORD).expect("fake server");
    let service = LoginService::from_settings(&TestFixtures::settings(server.url()));
    assert!(service.is_configured());

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(service))
            .configure(configure_services),
    )
    .await;

    let credentials = json!({ "email": TEST_EMAIL, "password": TEST_PASSWORD });

    let first = test::call_service(&app, login_request(&credentials).to_request()).await;
    assert_eq!(first.status(), StatusCode::OK);
    let first_cookies = session_cookies(&first);
    assert_eq!(first_cookies.len(), 1);
    assert!(first_cookies[0].contains("HttpOnly"));
    assert!(first_cookies[0].contains("SameSite=Lax"));
    assert!(first_cookies[0].contains("Max-Age=604800"));
    let body: Value = test::read_body_json(first).await;
    assert_eq!(
        body,
        json!({ "success": true, "message": "Login successful", "user": { "email": TEST_EMAIL } })
    );

    // Same request again: a second, independent provider call and session
    let second = test::call_service(&app, login_request(&credentials).to_request()).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_ne!(session_cookies(&second), first_cookies);
    assert_eq!(server.requests().len(), 2);

    server.stop().await;
}

#[actix_web::test]
async fn test_bad_password_is_unauthorized() {
    let server = FakeGoTrue::start(TEST_EMAIL, TEST_PASSWORD).expect("fake server");
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(LoginService::from_settings(
                &TestFixtures::settings(server.url()),
            )))
            .configure(configure_services),
    )
    .await;

    let resp = test::call_service(
        &app,
        login_request(&json!({ "email": TEST_EMAIL, "password": "nope" })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookies(&resp).is_empty());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "Invalid login credentials" }));

    server.stop().await;
}

#[actix_web::test]
async fn test_provider_without_session_is_server_error() {
    let server =
        FakeGoTrue::start_without_sessions(TEST_EMAIL, TEST_PASSWORD).expect("fake server");
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(LoginService::from_settings(
                &TestFixtures::settings(server.url()),
            )))
            .configure(configure_services),
    )
    .await;

    let resp = test::call_service(
        &app,
        login_request(&json!({ "email": TEST_EMAIL, "password": TEST_PASSWORD })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({ "error": "No session created" }));

    server.stop().await;
}

#[actix_web::test]
async fn test_unreachable_provider_is_internal_error() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("free port")
        .port();
    let settings = TestFixtures::settings(&format!("http://127.0.0.1:{port}"));
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(LoginService::from_settings(&settings)))
            .configure(configure_services),
    )
    .await;

    let resp = test::call_service(
        &app,
        login_request(&json!({ "email": TEST_EMAIL, "password": TEST_PASSWORD })).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], json!("Internal server error"));
    let details = body["details"].as_str().expect("details present");
    assert!(!details.is_empty());
}

#[actix_web::test]
async fn test_missing_configuration_from_settings() {
    let service = LoginService::from_settings(&AppSettings::default());
    assert!(!service.is_configured());

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(service))
            .configure(configure_services),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_payload("{definitely not json")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({ "error": "Server configuration error - Supabase credentials not found" })
    );
}
