//! Request middleware.
//!
//! Purpose: request lifecycle concerns shared by every route: trace
//! correlation and the credential gate.

pub mod auth_gate;
pub mod trace;

pub use auth_gate::{AuthGate, LEGACY_COOKIE, PRIMARY_COOKIE};
pub use trace::Trace;
