//! Config extraction: moving manifest fields into dedicated files.
//!
//! A [`ConfigTransform`] knows which files a manifest field may live in,
//! per target format, and renders the field's value into the chosen one.
//! The orchestrator registers a default set, lets plugins add their own,
//! and keeps a reserved set that always wins on name collisions.

use std::path::Path;

use indexmap::IndexMap;
use kiln_core::VirtualFileTree;
use serde_json::Value;

use crate::error::{Error, Result};

/// Target file format for an extracted config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// CommonJS module (`module.exports = ...`).
    Js,
    /// Plain JSON.
    Json,
    /// YAML document.
    Yaml,
    /// One string per line (e.g. browserslist).
    Lines,
}

impl ConfigFormat {
    fn name(self) -> &'static str {
        match self {
            ConfigFormat::Js => "js",
            ConfigFormat::Json => "json",
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Lines => "lines",
        }
    }
}

/// A rendered config file ready to be staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedConfig {
    pub filename: String,
    pub content: String,
}

/// Candidate files for a single manifest field, in preference order.
#[derive(Debug, Clone, Default)]
pub struct ConfigTransform {
    variants: Vec<(ConfigFormat, Vec<String>)>,
}

impl ConfigTransform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add candidate filenames for a format. The first registered format
    /// is the preferred one.
    pub fn format(
        mut self,
        format: ConfigFormat,
        filenames: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.variants
            .push((format, filenames.into_iter().map(Into::into).collect()));
        self
    }

    pub fn js(self, filenames: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.format(ConfigFormat::Js, filenames)
    }

    pub fn json(self, filenames: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.format(ConfigFormat::Json, filenames)
    }

    pub fn yaml(self, filenames: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.format(ConfigFormat::Yaml, filenames)
    }

    pub fn lines(self, filenames: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.format(ConfigFormat::Lines, filenames)
    }

    /// Render `value` into the chosen candidate file.
    ///
    /// A file already staged in the tree is reused (its format wins) so
    /// repeated extraction stays stable. With `check_existing`, on-disk
    /// files the engine does not own block extraction: the first
    /// non-conflicting candidate of the preferred format is used, and if
    /// every candidate is taken the extraction fails with
    /// [`Error::TransformConflict`].
    pub fn transform(
        &self,
        key: &str,
        value: &Value,
        check_existing: bool,
        files: &VirtualFileTree,
        context: &Path,
    ) -> Result<GeneratedConfig> {
        let (format, filename) = self.choose(key, check_existing, files, context)?;
        let content = match format {
            ConfigFormat::Js => format!("module.exports = {}\n", js_literal(value, 0)),
            ConfigFormat::Json => {
                let mut out = serde_json::to_string_pretty(value).map_err(|e| {
                    Box::new(Error::TransformRender {
                        key: key.to_string(),
                        format: format.name(),
                        reason: e.to_string(),
                    })
                })?;
                out.push('\n');
                out
            }
            ConfigFormat::Yaml => serde_yaml::to_string(value).map_err(|e| {
                Box::new(Error::TransformRender {
                    key: key.to_string(),
                    format: format.name(),
                    reason: e.to_string(),
                })
            })?,
            ConfigFormat::Lines => {
                let Some(items) = value.as_array() else {
                    return Err(Box::new(Error::TransformRender {
                        key: key.to_string(),
                        format: format.name(),
                        reason: "expected an array of strings".to_string(),
                    }));
                };
                let mut out = String::new();
                for item in items {
                    match item.as_str() {
                        Some(line) => {
                            out.push_str(line);
                            out.push('\n');
                        }
                        None => {
                            return Err(Box::new(Error::TransformRender {
                                key: key.to_string(),
                                format: format.name(),
                                reason: "expected an array of strings".to_string(),
                            }));
                        }
                    }
                }
                out
            }
        };
        Ok(GeneratedConfig { filename, content })
    }

    fn choose(
        &self,
        key: &str,
        check_existing: bool,
        files: &VirtualFileTree,
        context: &Path,
    ) -> Result<(ConfigFormat, String)> {
        // A file already staged for this field keeps its format.
        for (format, filenames) in &self.variants {
            for filename in filenames {
                if files.contains(filename) {
                    return Ok((*format, filename.clone()));
                }
            }
        }

        let Some((format, filenames)) = self.variants.first() else {
            return Err(Box::new(Error::TransformRender {
                key: key.to_string(),
                format: "none",
                reason: "transform has no candidate files".to_string(),
            }));
        };
        if !check_existing {
            return Ok((*format, filenames[0].clone()));
        }
        for filename in filenames {
            if !context.join(filename).exists() {
                return Ok((*format, filename.clone()));
            }
        }
        Err(Error::transform_conflict(key, filenames[0].clone()))
    }
}

/// Transforms every generation knows about.
pub fn default_config_transforms() -> IndexMap<String, ConfigTransform> {
    IndexMap::from([
        (
            "babel".to_string(),
            ConfigTransform::new().js(["babel.config.js"]),
        ),
        (
            "postcss".to_string(),
            ConfigTransform::new()
                .js(["postcss.config.js"])
                .json([".postcssrc.json", ".postcssrc"])
                .yaml([".postcssrc.yaml", ".postcssrc.yml"]),
        ),
        (
            "eslintConfig".to_string(),
            ConfigTransform::new()
                .js([".eslintrc.js"])
                .json([".eslintrc", ".eslintrc.json"])
                .yaml([".eslintrc.yaml", ".eslintrc.yml"]),
        ),
        (
            "jest".to_string(),
            ConfigTransform::new().js(["jest.config.js"]),
        ),
        (
            "browserslist".to_string(),
            ConfigTransform::new().lines([".browserslistrc"]),
        ),
    ])
}

/// Transforms plugins may not override.
pub fn reserved_config_transforms() -> IndexMap<String, ConfigTransform> {
    IndexMap::from([(
        "kiln".to_string(),
        ConfigTransform::new().js(["kiln.config.js"]),
    )])
}

/// Print a JSON value as a JavaScript literal with 2-space indentation.
///
/// Identifier-safe object keys are left unquoted and strings are
/// single-quoted, matching how hand-written JS configs look.
pub fn js_literal(value: &Value, depth: usize) -> String {
    let pad = "  ".repeat(depth + 1);
    let close = "  ".repeat(depth);
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote_js_string(s),
        Value::Array(items) => {
            if items.is_empty() {
                return "[]".to_string();
            }
            let body: Vec<String> = items
                .iter()
                .map(|item| format!("{pad}{}", js_literal(item, depth + 1)))
                .collect();
            format!("[\n{},\n{close}]", body.join(",\n"))
        }
        Value::Object(map) => {
            if map.is_empty() {
                return "{}".to_string();
            }
            let body: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{pad}{}: {}", js_key(k), js_literal(v, depth + 1)))
                .collect();
            format!("{{\n{},\n{close}}}", body.join(",\n"))
        }
    }
}

fn js_key(key: &str) -> String {
    let mut chars = key.chars();
    let identifier = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    };
    if identifier {
        key.to_string()
    } else {
        quote_js_string(key)
    }
}

fn quote_js_string(s: &str) -> String {
    let escaped = s
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('\n', "\\n");
    format!("'{escaped}'")
}
