//! Diesel table definitions for the document tables.
//!
//! These must match `backend/migrations` exactly.

diesel::table! {
    /// Documents of every collection.
    documents (collection, id) {
        collection -> Text,
        id -> Text,
        /// The document itself; always a JSON object.
        body -> Jsonb,
    }
}

diesel::table! {
    /// Unique field values claimed by documents.
    document_keys (collection, field, value) {
        collection -> Text,
        field -> Text,
        /// JSON encoding of the claimed value.
        value -> Text,
        document_id -> Text,
    }
}
