//! Field-level patch of a document.

use serde_json::{Map, Value};

/// Overwrite each key of `patch` onto `target`. Shallow: a nested object in `patch` replaces the
/// existing value wholesale. Keys absent from `patch` are left untouched.
pub fn merge_fields(target: &mut Map<String, Value>, patch: Map<String, Value>) {
    for (key, value) in patch {
        target.insert(key, value);
    }
}
