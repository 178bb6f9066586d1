pub mod application;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod resilience;
pub mod schema;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;

pub use application::{CartService, ResilienceConfig, ResilientCartService};
pub use auth::{IdentityVerifier, JwtVerifier};
pub use config::AppConfig;
pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    log::info!("Applied {} pending migration(s)", applied.len());
    Ok(())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::cart::get_cart,
        handlers::cart::add_to_cart,
        handlers::cart::delete_from_cart,
        handlers::cart::delete_cart,
    ),
    tags((name = "cart", description = "Per-user shopping cart"))
)]
pub struct ApiDoc;

/// Mounts the `/cart` routes. Expects a `web::Data<ResilientCartService>` and
/// a `web::Data<dyn IdentityVerifier>` in the app data.
pub fn cart_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/cart")
            .route("", web::get().to(handlers::cart::get_cart))
            .route("", web::delete().to(handlers::cart::delete_cart))
            .route("/add", web::post().to(handlers::cart::add_to_cart))
            .route("/{productId}", web::delete().to(handlers::cart::delete_from_cart)),
    );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    service: ResilientCartService,
    verifier: Arc<dyn IdentityVerifier>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let service = web::Data::new(service);
    let verifier = auth::verifier_data(verifier);

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .app_data(verifier.clone())
            .wrap(Logger::default())
            .configure(cart_routes)
    })
    .bind((host.to_string(), port))?
    .run())
}
