//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod document_store;
mod login_service;
mod password_hasher;
mod token_service;

#[cfg(test)]
pub use document_store::MockDocumentStore;
pub use document_store::{
    Clause, Collection, Condition, Document, DocumentStore, DocumentStoreError, Filter,
    FindOptions, SortOrder, compare_documents,
};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::{LoginService, LoginSession};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use token_service::MockTokenService;
pub use token_service::{IssuedToken, TokenError, TokenService};
