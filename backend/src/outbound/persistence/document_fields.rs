//! Field access shared by the store adapters.

use serde_json::Value;

use crate::domain::ports::{Collection, Document, DocumentStoreError};

/// The document's string `id`.
pub(super) fn document_id(document: &Document) -> Result<String, DocumentStoreError> {
    document
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| DocumentStoreError::query("document has no string id"))
}

/// Values `document` holds for the collection's unique fields. `null` and
/// missing values are skipped; they never collide.
pub(super) fn unique_values<'a>(
    collection: Collection,
    document: &'a Document,
) -> impl Iterator<Item = (&'static str, &'a Value)> + 'a {
    collection.unique_fields().iter().filter_map(move |field| {
        document
            .get(*field)
            .filter(|value| !value.is_null())
            .map(|value| (*field, value))
    })
}
