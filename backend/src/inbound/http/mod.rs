//! HTTP inbound adapter exposing the REST API.
//!
//! Handlers translate requests into domain calls and wrap results in the
//! shared envelope. Validation runs through [`validated::Validated`], caller
//! identity through [`identity`] extractors fed by the auth gate middleware.

pub mod accounts;
pub mod auth;
pub mod auth_settings;
pub mod bikes;
pub mod costs;
pub mod dashboard;
pub mod envelope;
pub mod error;
pub mod health;
pub mod identity;
pub mod partners;
pub mod reviews;
pub mod routes;
pub mod schemas;
pub mod state;
pub mod transactions;
pub mod validated;

pub use error::ApiResult;
