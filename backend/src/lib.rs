//! Second-hand motorcycle marketplace backend.
//!
//! The crate follows a hexagonal layout: [`domain`] holds entities, the
//! request validator, the auth gate and the use-case services; [`inbound`]
//! adapts them to HTTP; [`outbound`] implements the domain ports for the
//! document store, credential signing and password hashing.

pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use domain::TraceId;
pub use middleware::Trace;
