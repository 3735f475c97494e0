//! Marketplace entry-point: loads configuration, opens the document store,
//! seeds the first administrator and serves the HTTP API.

mod server;

use std::sync::Arc;

use actix_web::web;
use mockable::{Clock, DefaultClock, DefaultEnv};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use marketplace::inbound::http::auth_settings::{BuildMode, auth_settings_from_env};
use marketplace::inbound::http::health::HealthState;
use marketplace::inbound::http::state::{HttpState, HttpStatePorts};
use marketplace::outbound::persistence::acquire;
use marketplace::outbound::security::{BcryptPasswordHasher, JwtTokenService};
use marketplace::settings::ServerSettings;
use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load().map_err(|e| std::io::Error::other(e.to_string()))?;
    let auth = auth_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(std::io::Error::other)?;
    info!(
        fingerprint = %auth.fingerprint(),
        ephemeral = auth.ephemeral,
        "credential signing secret loaded"
    );

    let pool_config = settings
        .pool_config()
        .ok_or_else(|| std::io::Error::other("MARKETPLACE_DATABASE_URL must be set"))?;
    let store = acquire(&pool_config)
        .await
        .map_err(std::io::Error::other)?;
    info!(max_connections = pool_config.max_size(), "document store connected");

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let tokens = JwtTokenService::new(auth.secret(), settings.token_ttl(), Arc::clone(&clock));
    let http_state = HttpState::new(HttpStatePorts {
        store,
        tokens: Arc::new(tokens),
        hasher: Arc::new(BcryptPasswordHasher::default()),
        clock,
    })
    .with_cookie_policy(auth.cookies);
    let reviews = http_state
        .reviews
        .clone()
        .with_page_limits(settings.review_page_limits());
    let http_state = http_state.with_reviews(reviews);

    if let Some(admin) = settings.bootstrap_admin() {
        match http_state.accounts.bootstrap(admin).await {
            Ok(Some(account)) => info!(account_id = %account.id, "first administrator created"),
            Ok(None) => {}
            Err(err) => return Err(std::io::Error::other(err.to_string())),
        }
    }

    let health_state = web::Data::new(HealthState::new());
    let config = ServerConfig::new(settings.bind_addr(), http_state);
    info!(bind_addr = %config.bind_addr(), "starting marketplace API");
    create_server(health_state, config)?.await
}
