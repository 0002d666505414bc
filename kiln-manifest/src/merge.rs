//! Deep-merge semantics for manifest patches.
//!
//! Plugins extend the manifest with partial objects; merging recurses into
//! nested objects, concatenates arrays (dropping exact duplicates), and
//! lets scalars replace. Version-range collisions inside the dependency
//! blocks are not silently resolved: the incoming range wins but every
//! collision is reported back so the caller can surface a warning.

use serde_json::{Map, Value};

/// A dependency whose version range was replaced during a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepConflict {
    /// The dep block the collision happened in (`dependencies` or
    /// `devDependencies`).
    pub field: String,
    /// The package name.
    pub name: String,
    /// The range that was already present.
    pub previous: String,
    /// The range that replaced it.
    pub incoming: String,
}

/// Outcome of a [`deep_merge`] call.
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    /// Dependency version-range collisions, in encounter order.
    pub dep_conflicts: Vec<DepConflict>,
}

impl MergeReport {
    pub fn is_clean(&self) -> bool {
        self.dep_conflicts.is_empty()
    }
}

const DEP_BLOCKS: [&str; 2] = ["dependencies", "devDependencies"];

/// Merge `patch` into `target`.
///
/// Objects merge recursively, arrays concatenate with exact-duplicate
/// elements dropped, and any other value replaces what was there.
pub fn deep_merge(target: &mut Map<String, Value>, patch: &Map<String, Value>) -> MergeReport {
    let mut report = MergeReport::default();
    for (key, incoming) in patch {
        merge_field(target, key, incoming, None, &mut report);
    }
    report
}

fn merge_field(
    target: &mut Map<String, Value>,
    key: &str,
    incoming: &Value,
    dep_block: Option<&str>,
    report: &mut MergeReport,
) {
    if !target.contains_key(key) {
        target.insert(key.to_string(), incoming.clone());
        return;
    }

    let existing = target.get_mut(key).expect("key checked above");
    match (existing, incoming) {
        (Value::Object(existing), Value::Object(incoming)) => {
            let block = if dep_block.is_none() && DEP_BLOCKS.contains(&key) {
                Some(key)
            } else {
                None
            };
            for (k, v) in incoming {
                merge_field(existing, k, v, block, report);
            }
        }
        (Value::Array(existing), Value::Array(incoming)) => {
            for item in incoming {
                if !existing.contains(item) {
                    existing.push(item.clone());
                }
            }
        }
        (existing, incoming) => {
            if *existing != *incoming {
                if let (Some(block), Value::String(previous), Value::String(next)) =
                    (dep_block, &*existing, incoming)
                {
                    report.dep_conflicts.push(DepConflict {
                        field: block.to_string(),
                        name: key.to_string(),
                        previous: previous.clone(),
                        incoming: next.clone(),
                    });
                }
                *existing = incoming.clone();
            }
        }
    }
}
