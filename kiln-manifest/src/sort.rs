//! Stable key ordering for JSON objects.
//!
//! Regenerating a project must not reshuffle `package.json`; every object
//! the generator emits is sorted with a fixed priority list followed by
//! the remaining keys alphabetically.

use serde_json::{Map, Value};

/// Reorder a JSON object in place: `priority` keys first, in the given
/// order, then all remaining keys alphabetically.
///
/// Priority keys absent from the object are skipped. The sort is stable
/// with respect to values; only key order changes.
///
/// # Examples
///
/// ```
/// use serde_json::{Map, Value, json};
/// use kiln_manifest::sort_object;
///
/// let mut map: Map<String, Value> = serde_json::from_value(
///     json!({ "zeta": 1, "name": 2, "alpha": 3 })
/// ).unwrap();
/// sort_object(&mut map, &["name"]);
///
/// let keys: Vec<&String> = map.keys().collect();
/// assert_eq!(keys, ["name", "alpha", "zeta"]);
/// ```
pub fn sort_object(map: &mut Map<String, Value>, priority: &[&str]) {
    let mut sorted = Map::with_capacity(map.len());

    for key in priority {
        if let Some(value) = map.remove(*key) {
            sorted.insert((*key).to_string(), value);
        }
    }

    let mut rest: Vec<String> = map.keys().cloned().collect();
    rest.sort();
    for key in rest {
        let value = map.remove(&key).unwrap();
        sorted.insert(key, value);
    }

    *map = sorted;
}
