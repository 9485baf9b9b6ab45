#![warn(clippy::pedantic)]
#![warn(clippy::cargo)]
#![deny(warnings)]
#![allow(clippy::multiple_crate_versions)]

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use awards_auth::{configure_services, AppSettings, LoginService};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from Settings.toml and environment variables
    // This also loads .env file and initializes the logger
    let settings = AppSettings::load()
        .map_err(|e| anyhow::anyhow!("Failed to load settings: {e}"))?;

    // Provider settings are validated once here; requests never read the environment
    let login_service = web::Data::new(LoginService::from_settings(&settings));

    start_server(login_service, settings).await
}

/// Start the HTTP server
///
/// # Errors
///
/// Returns an error if:
/// - Server binding fails
/// - Server fails to start
async fn start_server(
    login_service: web::Data<LoginService>,
    settings: AppSettings,
) -> anyhow::Result<()> {
    let bind_address = settings.get_bind_address();
    print_startup_info(&bind_address, login_service.is_configured());

    let cors_origins = settings.get_cors_origins();

    HttpServer::new(move || {
        let cors_origins = cors_origins.clone();
        let cors = Cors::default()
            .allowed_origin_fn(move |origin, _| {
                cors_origins
                    .iter()
                    .any(|allowed| allowed == origin.to_str().unwrap_or(""))
            })
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allowed_headers(vec!["Content-Type", "Accept"])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(login_service.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .configure(configure_services)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {bind_address}"))?
    .run()
    .await
    .context("Server terminated with an error")
}

fn print_startup_info(bind_address: &str, provider_configured: bool) {
    println!(
        "Starting awards-auth {} on http://{bind_address}",
        awards_auth::VERSION
    );
    println!(
        "Identity provider: {}",
        if provider_configured {
            "configured"
        } else {
            "NOT configured (logins will fail with 500)"
        }
    );
    println!();
    println!("Endpoints:");
    println!("  POST /api/auth/login - Email/password login");
    println!("  GET  /ping           - Health check");
}
