//! Key-by-key merge of config documents.

use serde_json::Value;

/// Fold `overlay` into `base`. Objects merge recursively; any other value,
/// arrays included, replaces what was there.
pub(super) fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
