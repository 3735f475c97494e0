//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: the in-process document store and its shared handle
//! - **security**: HS256 credentials (`jsonwebtoken`) and bcrypt hashing
//!
//! Adapters are thin translators between domain types and library
//! representations. They contain no business logic.

pub mod persistence;
pub mod security;
