//! The in-memory virtual file tree.
//!
//! All generation output is staged in a [`VirtualFileTree`] keyed by
//! forward-slash relative paths, and flushed to disk exactly once at the
//! end of a run. Flushing diffs against a prior snapshot so re-invocations
//! delete files that disappeared from the tree.

use std::{fs, path::Path};

use eyre::Result;
use indexmap::IndexMap;

/// Content of a single staged file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    Binary(Vec<u8>),
}

impl FileContent {
    /// Get the content as text, if it is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FileContent::Text(s) => Some(s),
            FileContent::Binary(_) => None,
        }
    }

    /// Get the raw bytes, regardless of variant.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileContent::Text(s) => s.as_bytes(),
            FileContent::Binary(b) => b,
        }
    }
}

impl From<&str> for FileContent {
    fn from(s: &str) -> Self {
        FileContent::Text(s.to_string())
    }
}

impl From<String> for FileContent {
    fn from(s: String) -> Self {
        FileContent::Text(s)
    }
}

impl From<Vec<u8>> for FileContent {
    fn from(b: Vec<u8>) -> Self {
        FileContent::Binary(b)
    }
}

/// Rewrite a path to canonical forward-slash form, dropping `.` segments
/// and empty segments from doubled separators.
pub(crate) fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// The staging area for all generated output.
///
/// Maps relative paths to file content. Insertion order is preserved so
/// repeated runs over the same inputs produce the same tree, and a later
/// insert to an existing path replaces the content in place (last write
/// wins).
#[derive(Debug, Clone, Default)]
pub struct VirtualFileTree {
    files: IndexMap<String, FileContent>,
}

impl VirtualFileTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a file. Replaces any previous content at the same path.
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<FileContent>) {
        self.files.insert(path.into(), content.into());
    }

    /// Remove a staged file, returning its content if it was present.
    pub fn remove(&mut self, path: &str) -> Option<FileContent> {
        self.files.shift_remove(path)
    }

    /// Get the content staged at a path.
    pub fn get(&self, path: &str) -> Option<&FileContent> {
        self.files.get(path)
    }

    /// Get the text content staged at a path, if it is text.
    pub fn get_text(&self, path: &str) -> Option<&str> {
        self.files.get(path).and_then(FileContent::as_text)
    }

    /// Check whether a path is staged.
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Iterate over staged paths in insertion order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Iterate over staged entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileContent)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Take a snapshot for later diffing against the final tree.
    pub fn snapshot(&self) -> Self {
        self.clone()
    }

    /// Rewrite every key to canonical forward-slash form.
    ///
    /// If normalization makes two keys collide, the later entry's content
    /// wins.
    pub fn normalize_paths(&mut self) {
        if self.files.keys().all(|k| normalize_path(k) == *k) {
            return;
        }
        let mut normalized = IndexMap::with_capacity(self.files.len());
        for (path, content) in self.files.drain(..) {
            normalized.insert(normalize_path(&path), content);
        }
        self.files = normalized;
    }

    /// Flush the tree to disk under `context`.
    ///
    /// Writes every new or changed entry and deletes every path present in
    /// `previous` but absent here. Entries whose on-disk bytes already
    /// match are left untouched.
    pub fn write_to_disk(&self, context: &Path, previous: &VirtualFileTree) -> Result<()> {
        for path in previous.paths() {
            if !self.contains(path) {
                let target = context.join(path);
                if target.exists() {
                    fs::remove_file(&target)?;
                }
            }
        }

        for (path, content) in self.iter() {
            let target = context.join(path);
            if let Ok(existing) = fs::read(&target)
                && existing == content.as_bytes()
            {
                continue;
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, content.as_bytes())?;
        }

        Ok(())
    }
}

impl<P: Into<String>, C: Into<FileContent>> FromIterator<(P, C)> for VirtualFileTree {
    fn from_iter<T: IntoIterator<Item = (P, C)>>(iter: T) -> Self {
        let mut tree = VirtualFileTree::new();
        for (path, content) in iter {
            tree.insert(path, content);
        }
        tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_last_write_wins() {
        let mut tree = VirtualFileTree::new();
        tree.insert("README.md", "first");
        tree.insert("README.md", "second");

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get_text("README.md"), Some("second"));
    }

    #[test]
    fn test_collect_from_pairs() {
        let tree: VirtualFileTree = [("src/main.js", "entry\n"), ("README.md", "# demo\n")]
            .into_iter()
            .collect();

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get_text("src/main.js"), Some("entry\n"));
        assert_eq!(tree.get_text("README.md"), Some("# demo\n"));
    }

    #[test]
    fn test_normalize_paths_mixed_separators() {
        let mut tree = VirtualFileTree::new();
        tree.insert("src\\main.js", "a");
        tree.insert("src/util\\helpers.js", "b");
        tree.insert("plain.txt", "c");
        tree.normalize_paths();

        let paths: Vec<&str> = tree.paths().collect();
        assert_eq!(paths, vec!["src/main.js", "src/util/helpers.js", "plain.txt"]);
    }

    #[test]
    fn test_normalize_paths_drops_dot_segments() {
        let mut tree = VirtualFileTree::new();
        tree.insert("./README.md", "a");
        tree.insert("src//./main.js", "b");
        tree.normalize_paths();

        let paths: Vec<&str> = tree.paths().collect();
        assert_eq!(paths, vec!["README.md", "src/main.js"]);
    }

    #[test]
    fn test_normalize_paths_collision_keeps_later_content() {
        let mut tree = VirtualFileTree::new();
        tree.insert("src/main.js", "slash");
        tree.insert("src\\main.js", "backslash");
        tree.normalize_paths();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get_text("src/main.js"), Some("backslash"));
    }

    #[test]
    fn test_binary_content_roundtrip() {
        let mut tree = VirtualFileTree::new();
        tree.insert("logo.png", vec![0x89u8, 0x50, 0x4e, 0x47]);

        let content = tree.get("logo.png").unwrap();
        assert!(content.as_text().is_none());
        assert_eq!(content.as_bytes(), &[0x89, 0x50, 0x4e, 0x47]);
    }

    #[test]
    fn test_write_to_disk_creates_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut tree = VirtualFileTree::new();
        tree.insert("src/main.js", "console.log('hi')\n");
        tree.insert("public/index.html", "<html></html>\n");

        tree.write_to_disk(dir.path(), &VirtualFileTree::new()).unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("src/main.js")).unwrap(),
            "console.log('hi')\n"
        );
        assert!(dir.path().join("public/index.html").exists());
    }

    #[test]
    fn test_write_to_disk_deletes_removed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let mut previous = VirtualFileTree::new();
        previous.insert("old.txt", "old");
        previous.insert("kept.txt", "kept");
        previous.write_to_disk(dir.path(), &VirtualFileTree::new()).unwrap();

        let mut next = VirtualFileTree::new();
        next.insert("kept.txt", "kept");
        next.write_to_disk(dir.path(), &previous).unwrap();

        assert!(!dir.path().join("old.txt").exists());
        assert!(dir.path().join("kept.txt").exists());
    }

    #[test]
    fn test_write_to_disk_skips_unchanged_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut tree = VirtualFileTree::new();
        tree.insert("same.txt", "stable");
        tree.write_to_disk(dir.path(), &VirtualFileTree::new()).unwrap();

        let before = fs::metadata(dir.path().join("same.txt")).unwrap().modified().unwrap();
        tree.write_to_disk(dir.path(), &tree.snapshot()).unwrap();
        let after = fs::metadata(dir.path().join("same.txt")).unwrap().modified().unwrap();

        assert_eq!(before, after);
    }
}
