//! Server construction.

mod config;

pub use config::ServerConfig;

use actix_web::HttpServer;
use actix_web::dev::Server;
use actix_web::web;

use marketplace::inbound::http::health::HealthState;
use marketplace::inbound::http::routes::application;

/// Construct an Actix HTTP server using the provided health state and
/// configuration.
///
/// Readiness is flipped once the listener is bound, so health checks only report
/// ready when the socket accepts connections.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let ServerConfig {
        bind_addr,
        http_state,
    } = config;

    let server = HttpServer::new(move || {
        application(http_state.clone(), server_health_state.clone())
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
