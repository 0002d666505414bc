//! The package descriptor and its deterministic serialization.

use std::{fs, path::Path};

use serde_json::{Map, Value};

use crate::{
    error::{Error, Result},
    merge::{MergeReport, deep_merge},
    sort::sort_object,
};

/// Well-known top-level keys, emitted first and in this order.
pub const TOP_LEVEL_PRIORITY: [&str; 19] = [
    "name",
    "version",
    "private",
    "description",
    "author",
    "scripts",
    "main",
    "module",
    "browser",
    "files",
    "dependencies",
    "devDependencies",
    "peerDependencies",
    "kiln",
    "babel",
    "eslintConfig",
    "postcss",
    "browserslist",
    "jest",
];

/// Well-known script names, emitted first and in this order.
pub const SCRIPT_PRIORITY: [&str; 6] = ["serve", "build", "test:unit", "test:e2e", "lint", "deploy"];

const RESERVED_MAP_KEYS: [&str; 3] = ["dependencies", "devDependencies", "scripts"];

/// The project's package descriptor.
///
/// A thin wrapper over an order-preserving JSON object. The generator
/// mutates it through [`Manifest::merge`] and field accessors, then calls
/// [`Manifest::sort`] once so regeneration produces byte-identical output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    fields: Map<String, Value>,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a manifest from a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(Error::validation(format!(
                "expected a top-level object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Parse a manifest from JSON source.
    pub fn parse(src: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(src).map_err(Error::parse)?;
        Self::from_value(value)
    }

    /// Load and parse `package.json` from a project directory.
    pub fn load(context: &Path) -> Result<Self> {
        let path = context.join("package.json");
        let src = fs::read_to_string(&path).map_err(|source| Error::io(&path, source))?;
        Self::parse(&src)
    }

    /// Validate the structural invariants the generator relies on.
    ///
    /// `name`, when present, must be a string; `dependencies`,
    /// `devDependencies` and `scripts`, when present, must be objects
    /// mapping names to strings.
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = self.fields.get("name")
            && !name.is_string()
        {
            return Err(Error::validation("'name' must be a string"));
        }
        for key in RESERVED_MAP_KEYS {
            let Some(value) = self.fields.get(key) else {
                continue;
            };
            let Some(map) = value.as_object() else {
                return Err(Error::validation(format!("'{key}' must be an object")));
            };
            for (entry, v) in map {
                if !v.is_string() {
                    return Err(Error::validation(format!(
                        "'{key}.{entry}' must be a string"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    /// Remove a field, preserving the order of the remaining keys.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    pub fn dependencies(&self) -> Option<&Map<String, Value>> {
        self.fields.get("dependencies").and_then(Value::as_object)
    }

    pub fn dev_dependencies(&self) -> Option<&Map<String, Value>> {
        self.fields.get("devDependencies").and_then(Value::as_object)
    }

    pub fn scripts(&self) -> Option<&Map<String, Value>> {
        self.fields.get("scripts").and_then(Value::as_object)
    }

    /// Names declared in either dependency block, dependencies first.
    pub fn dep_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for block in [self.dependencies(), self.dev_dependencies()].into_iter().flatten() {
            names.extend(block.keys().cloned());
        }
        names
    }

    /// Deep-merge a patch object into the manifest.
    pub fn merge(&mut self, patch: &Map<String, Value>) -> MergeReport {
        deep_merge(&mut self.fields, patch)
    }

    /// Apply the deterministic key ordering: the fixed priority list at
    /// the top level, the script priority list inside `scripts`, and
    /// alphabetical order inside both dependency blocks.
    pub fn sort(&mut self) {
        for block in ["dependencies", "devDependencies"] {
            if let Some(Value::Object(map)) = self.fields.get_mut(block) {
                sort_object(map, &[]);
            }
        }
        if let Some(Value::Object(scripts)) = self.fields.get_mut("scripts") {
            sort_object(scripts, &SCRIPT_PRIORITY);
        }
        sort_object(&mut self.fields, &TOP_LEVEL_PRIORITY);
    }

    /// Serialize as 2-space-indented JSON with a trailing newline.
    pub fn to_pretty_string(&self) -> String {
        let mut out = serde_json::to_string_pretty(&Value::Object(self.fields.clone()))
            .expect("manifest is valid JSON");
        out.push('\n');
        out
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
