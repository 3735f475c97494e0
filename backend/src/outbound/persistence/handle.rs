//! Process-wide document store handle.
//!
//! The first call to [`acquire`] migrates the database and builds the
//! connection pool; concurrent first callers wait on the same
//! initialisation and every later call returns the same handle. The handle
//! lives for the rest of the process.

use std::sync::Arc;

use tokio::sync::OnceCell;

use super::diesel_document_store::DieselDocumentStore;
use super::pool::PoolConfig;
use crate::domain::ports::DocumentStoreError;

static HANDLE: OnceCell<Arc<DieselDocumentStore>> = OnceCell::const_new();

/// Shared pooled store, connected with `config` on first use.
///
/// `config` is ignored once the handle exists. A failed first connect leaves
/// the handle unset so a later call may retry.
///
/// # Errors
///
/// Returns [`DocumentStoreError::Connection`] when the first connect fails.
pub async fn acquire(config: &PoolConfig) -> Result<Arc<DieselDocumentStore>, DocumentStoreError> {
    HANDLE
        .get_or_try_init(|| async { DieselDocumentStore::connect(config).await.map(Arc::new) })
        .await
        .map(Arc::clone)
}
