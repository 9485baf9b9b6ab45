// HTTP request handlers
pub mod health;
pub mod login;


use actix_web::web;

pub use health::health;
pub use login::{login, LoginService};

/// Register all routes
pub fn configure_services(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/auth/login", web::post().to(login))
        .route("/ping", web::get().to(health));
}
