//! Installed-package version queries.
//!
//! `has_plugin` version-range checks need to know what is actually
//! installed; that concern is behind a trait so tests and embedders can
//! supply their own source of truth.

use std::{collections::HashMap, fs, path::PathBuf};

use semver::Version;

/// Query interface over the project's installed packages.
pub trait PackageManager: Send + Sync {
    /// The installed version of a package, if it is installed.
    fn installed_version(&self, package: &str) -> Option<Version>;
}

/// Reads versions from `node_modules/<package>/package.json`.
pub struct NodeModulesPackageManager {
    context: PathBuf,
}

impl NodeModulesPackageManager {
    pub fn new(context: impl Into<PathBuf>) -> Self {
        Self { context: context.into() }
    }
}

impl PackageManager for NodeModulesPackageManager {
    fn installed_version(&self, package: &str) -> Option<Version> {
        let manifest = self.context.join("node_modules").join(package).join("package.json");
        let src = fs::read_to_string(manifest).ok()?;
        let value: serde_json::Value = serde_json::from_str(&src).ok()?;
        value.get("version")?.as_str()?.parse().ok()
    }
}

/// A fixed in-memory version table, for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct FixedPackageManager {
    versions: HashMap<String, Version>,
}

impl FixedPackageManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, package: impl Into<String>, version: Version) -> Self {
        self.versions.insert(package.into(), version);
        self
    }
}

impl PackageManager for FixedPackageManager {
    fn installed_version(&self, package: &str) -> Option<Version> {
        self.versions.get(package).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_modules_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let pkg_dir = dir.path().join("node_modules/@kiln/cli-plugin-babel");
        fs::create_dir_all(&pkg_dir).unwrap();
        fs::write(pkg_dir.join("package.json"), r#"{ "version": "0.2.1" }"#).unwrap();

        let pm = NodeModulesPackageManager::new(dir.path());
        assert_eq!(
            pm.installed_version("@kiln/cli-plugin-babel"),
            Some(Version::new(0, 2, 1))
        );
        assert_eq!(pm.installed_version("@kiln/cli-plugin-router"), None);
    }

    #[test]
    fn test_fixed_lookup() {
        let pm = FixedPackageManager::new().with("kiln", Version::new(0, 2, 0));
        assert!(pm.installed_version("kiln").is_some());
        assert!(pm.installed_version("vitest").is_none());
    }
}
