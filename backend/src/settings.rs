//! Server settings loaded via OrthoConfig.
//!
//! Values come from `MARKETPLACE_*` environment variables, an optional
//! configuration file and command-line flags, in the precedence order
//! `ortho_config` applies.

use std::net::SocketAddr;

use chrono::TimeDelta;
use ortho_config::OrthoConfig;
use pagination::PageLimits;
use serde::Deserialize;

use crate::domain::{BootstrapAdmin, REVIEW_PAGE_LIMITS};
use crate::outbound::persistence::PoolConfig;

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
const DEFAULT_ADMIN_NAME: &str = "Administrator";

/// Configuration values controlling the HTTP server and its store.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MARKETPLACE")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<SocketAddr>,
    /// PostgreSQL connection URL of the document store.
    pub database_url: Option<String>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Email of the first administrator, created when no account exists.
    pub admin_email: Option<String>,
    /// Password of the first administrator.
    pub admin_password: Option<String>,
    /// Display name of the first administrator.
    pub admin_name: Option<String>,
    /// Lifetime of issued credentials, in hours.
    pub token_ttl_hours: Option<i64>,
    /// Default page size of the public review listing.
    pub review_page_size: Option<u32>,
}

impl ServerSettings {
    /// Return the bind address, falling back to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)))
    }

    /// Return the credential lifetime. Non-positive values fall back to the
    /// default of 24 hours.
    pub fn token_ttl(&self) -> TimeDelta {
        let hours = self
            .token_ttl_hours
            .filter(|hours| *hours > 0)
            .unwrap_or(DEFAULT_TOKEN_TTL_HOURS);
        TimeDelta::try_hours(hours).unwrap_or_else(|| TimeDelta::hours(DEFAULT_TOKEN_TTL_HOURS))
    }

    /// Page limits for the public review listing. The configured size is
    /// clamped to the listing maximum.
    pub fn review_page_limits(&self) -> PageLimits {
        let max = REVIEW_PAGE_LIMITS.max_limit();
        let default = self
            .review_page_size
            .map_or(REVIEW_PAGE_LIMITS.default_limit(), |size| size.clamp(1, max));
        PageLimits::new(default, max)
    }

    /// Pool settings for the document store, present once a database URL
    /// is configured.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        let url = self.database_url.as_deref().map(str::trim).filter(|u| !u.is_empty())?;
        let config = PoolConfig::new(url);
        Some(match self.db_max_connections {
            Some(max) => config.with_max_size(max),
            None => config,
        })
    }

    /// First-administrator credentials, present only when both email and
    /// password are configured.
    pub fn bootstrap_admin(&self) -> Option<BootstrapAdmin> {
        let email = self.admin_email.as_deref().map(str::trim).filter(|e| !e.is_empty())?;
        let password = self.admin_password.as_deref().filter(|p| !p.is_empty())?;
        Some(BootstrapAdmin {
            email: email.to_lowercase(),
            password: password.to_owned(),
            name: self
                .admin_name
                .clone()
                .unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_owned()),
        })
    }
}
