//! Helper for applying partial updates.

/// Copy `Some` fields of a patch onto a record.
///
/// Fields before the `;` overwrite the target directly; fields after it are
/// stored as `Some(value)` on an optional target field.
macro_rules! apply_fields {
    ($target:expr, $patch:expr; $($field:ident),* ; $($optional:ident),*) => {
        $( if let Some(value) = $patch.$field { $target.$field = value; } )*
        $( if let Some(value) = $patch.$optional { $target.$optional = Some(value); } )*
    };
}

pub(crate) use apply_fields;
