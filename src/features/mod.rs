// Business logic for access control, redemption and engagement
pub mod access;
pub mod audit;
pub mod comments;
pub mod ideas;
pub mod progress;
pub mod reactions;
pub mod redemption;
pub mod unlock;

/// In-memory document store used by the feature tests to apply the same
/// write plans the Firestore commit API receives.
#[cfg(test)]
pub(crate) mod testutil {
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    use crate::api::firestore::{FieldTransform, Write};

    /// Fixed commit timestamp stamped by the fake server
    pub const SERVER_TIME: &str = "2026-02-01T12:00:00+00:00";

    pub type MemStore = BTreeMap<String, Value>;

    /// Apply a write plan atomically to the in-memory store
    pub fn apply(store: &mut MemStore, writes: &[Write]) {
        for w in writes {
            match w {
                Write::Delete { path } => {
                    store.remove(path);
                }
                Write::Set {
                    path,
                    fields,
                    transforms,
                } => {
                    let entry = store.entry(path.clone()).or_insert_with(|| json!({}));
                    if let (Some(obj), Some(new)) = (entry.as_object_mut(), fields.as_object()) {
                        for (k, v) in new {
                            obj.insert(k.clone(), v.clone());
                        }
                    }
                    for t in transforms {
                        match t {
                            FieldTransform::Increment { field, by } => {
                                let slot = field_slot(entry, field);
                                let cur = slot.as_i64().unwrap_or(0);
                                *slot = json!(cur + by);
                            }
                            FieldTransform::ServerTimestamp { field } => {
                                *field_slot(entry, field) = json!(SERVER_TIME);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Navigate a dotted field path, creating intermediate maps
    fn field_slot<'a>(doc: &'a mut Value, path: &str) -> &'a mut Value {
        let mut slot = doc;
        for part in path.split('.') {
            if !slot.is_object() {
                *slot = json!({});
            }
            slot = slot
                .as_object_mut()
                .unwrap()
                .entry(part.to_string())
                .or_insert(Value::Null);
        }
        slot
    }

    /// Documents whose path starts with `prefix`
    pub fn docs_under<'a>(store: &'a MemStore, prefix: &str) -> Vec<(&'a String, &'a Value)> {
        store.iter().filter(|(k, _)| k.starts_with(prefix)).collect()
    }
}
