use std::io;
use std::sync::Arc;

use cart_service::infrastructure::{DieselCartRepository, HttpPriceLookup};
use cart_service::{build_server, run_migrations, AppConfig, CartService, JwtVerifier, ResilientCartService};
use dotenvy::dotenv;

fn startup_error(context: &str, e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, e))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| startup_error("Invalid configuration", e))?;

    let repo = DieselCartRepository::connect(&config.store)
        .map_err(|e| startup_error("Failed to connect to the cart store", e))?;
    run_migrations(repo.pool()).map_err(|e| startup_error("Failed to run database migrations", e))?;

    let pricing = HttpPriceLookup::new(config.catalog_url.clone(), config.catalog_timeout)
        .map_err(|e| startup_error("Failed to build catalog client", e))?;

    let service = ResilientCartService::new(
        CartService::new(Arc::new(repo), Arc::new(pricing), config.pricing_concurrency),
        config.resilience.clone(),
    );
    let verifier = Arc::new(JwtVerifier::new(&config.jwt_secret, config.jwt_issuer.as_deref()));

    log::info!("Starting cart service at http://{}:{}", config.host, config.port);

    build_server(service, verifier, &config.host, config.port)?.await
}
