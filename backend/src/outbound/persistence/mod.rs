//! Document persistence adapters.
//!
//! # Architecture
//!
//! - **Thin adapters**: the stores only move JSON documents. Entity mapping
//!   and error translation live in the domain repository.
//! - **PostgreSQL JSONB**: [`DieselDocumentStore`] keeps every collection in
//!   one `documents` table and enforces unique fields through
//!   `document_keys`, both written in a single transaction.
//! - **Async pooling**: `diesel-async` connections are drawn from a `bb8`
//!   pool; migrations are embedded and applied before the pool opens.
//! - **Single handle**: [`acquire`] lazily opens one store for the process.
//!
//! # Example
//!
//! ```no_run
//! use marketplace::outbound::persistence::{PoolConfig, acquire};
//!
//! # async fn run() -> Result<(), marketplace::domain::ports::DocumentStoreError> {
//! let store = acquire(&PoolConfig::new("postgres://localhost/marketplace")).await?;
//! # drop(store);
//! # Ok(())
//! # }
//! ```

mod diesel_document_store;
mod document_fields;
mod document_query;
mod handle;
#[cfg(any(test, feature = "test-support"))]
mod memory_store;
mod pool;
mod schema;

pub use diesel_document_store::DieselDocumentStore;
pub use handle::acquire;
#[cfg(any(test, feature = "test-support"))]
pub use memory_store::MemoryDocumentStore;
pub use pool::{DbPool, PoolConfig, PoolError};
