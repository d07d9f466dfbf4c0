//! Mock implementations for testing.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use trowel_vfs::{TreeDir, VfsError, VfsResult, VirtualTree};

/// A change recorded by [`MemoryTree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeChange {
    /// A new file.
    Create {
        /// Tree path.
        path: String,
        /// Content size in bytes.
        size: usize,
    },
    /// New content for an existing file.
    Overwrite {
        /// Tree path.
        path: String,
        /// Content size in bytes.
        size: usize,
    },
    /// A removed file or directory.
    Delete {
        /// Tree path.
        path: String,
    },
    /// A moved file or directory.
    Rename {
        /// Source tree path.
        from: String,
        /// Destination tree path.
        to: String,
    },
}

impl TreeChange {
    /// The path the change applies to (the source for a rename).
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::Create { path, .. } | Self::Overwrite { path, .. } | Self::Delete { path } => {
                path.as_str()
            },
            Self::Rename { from, .. } => from.as_str(),
        }
    }
}

impl fmt::Display for TreeChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create { path, size } => write!(f, "CREATE {path} ({size} bytes)"),
            Self::Overwrite { path, size } => write!(f, "UPDATE {path} ({size} bytes)"),
            Self::Delete { path } => write!(f, "DELETE {path}"),
            Self::Rename { from, to } => write!(f, "RENAME {from} => {to}"),
        }
    }
}

#[derive(Debug, Default)]
struct TreeState {
    files: BTreeMap<String, Vec<u8>>,
    changes: Vec<TreeChange>,
}

impl TreeState {
    fn is_file(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    fn has_children(&self, path: &str) -> bool {
        let prefix = dir_prefix(path);
        self.files.keys().any(|k| k.starts_with(&prefix))
    }

    fn keys_under(&self, path: &str) -> Vec<String> {
        let prefix = dir_prefix(path);
        self.files
            .keys()
            .filter(|k| k.as_str() == path || k.starts_with(&prefix))
            .cloned()
            .collect()
    }
}

/// An in-memory [`VirtualTree`] that records every mutation.
///
/// Files live in a flat map keyed by tree path; directories exist
/// implicitly while they contain files. Seeded files (see
/// [`MemoryTree::with_file`]) are not recorded as changes.
#[derive(Debug, Default)]
pub struct MemoryTree {
    state: Mutex<TreeState>,
}

impl MemoryTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file without recording a change.
    #[must_use]
    pub fn with_file(self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        if let Ok(mut state) = self.state.lock() {
            state.files.insert(key(path), content.into());
        }
        self
    }

    /// Recorded changes, oldest first.
    #[must_use]
    pub fn changes(&self) -> Vec<TreeChange> {
        self.state
            .lock()
            .map(|state| state.changes.clone())
            .unwrap_or_default()
    }

    /// Content of a file in the tree.
    #[must_use]
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.state.lock().ok()?.files.get(&key(path)).cloned()
    }

    /// All file paths in the tree, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|state| state.files.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn state(&self) -> VfsResult<MutexGuard<'_, TreeState>> {
        self.state
            .lock()
            .map_err(|_| VfsError::Backend("memory tree lock poisoned".into()))
    }
}

fn key(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    format!("/{trimmed}")
}

fn dir_prefix(path: &str) -> String {
    if path == "/" {
        "/".to_owned()
    } else {
        format!("{path}/")
    }
}

impl VirtualTree for MemoryTree {
    fn read(&self, path: &str) -> Option<Vec<u8>> {
        self.file(path)
    }

    fn create(&self, path: &str, content: &[u8]) -> VfsResult<()> {
        let path = key(path);
        let mut state = self.state()?;
        if state.is_file(&path) {
            return Err(VfsError::Backend(format!("{path} already exists")));
        }
        state.files.insert(path.clone(), content.to_vec());
        state.changes.push(TreeChange::Create {
            path,
            size: content.len(),
        });
        Ok(())
    }

    fn overwrite(&self, path: &str, content: &[u8]) -> VfsResult<()> {
        let path = key(path);
        let mut state = self.state()?;
        if !state.is_file(&path) {
            return Err(VfsError::Backend(format!("{path} is not a file")));
        }
        state.files.insert(path.clone(), content.to_vec());
        state.changes.push(TreeChange::Overwrite {
            path,
            size: content.len(),
        });
        Ok(())
    }

    fn delete(&self, path: &str) -> VfsResult<()> {
        let path = key(path);
        if path == "/" {
            return Err(VfsError::Backend("refusing to delete the tree root".into()));
        }
        let mut state = self.state()?;
        let doomed = state.keys_under(&path);
        if doomed.is_empty() {
            return Err(VfsError::Backend(format!("{path} does not exist")));
        }
        for k in doomed {
            state.files.remove(&k);
        }
        state.changes.push(TreeChange::Delete { path });
        Ok(())
    }

    fn rename(&self, from: &str, to: &str) -> VfsResult<()> {
        let (from, to) = (key(from), key(to));
        if from == "/" || to == "/" {
            return Err(VfsError::Backend("refusing to move the tree root".into()));
        }
        let mut state = self.state()?;
        let moving = state.keys_under(&from);
        if moving.is_empty() {
            return Err(VfsError::Backend(format!("{from} does not exist")));
        }
        for old in moving {
            if let Some(content) = state.files.remove(&old) {
                let new = format!("{to}{}", &old[from.len()..]);
                state.files.insert(new, content);
            }
        }
        state.changes.push(TreeChange::Rename { from, to });
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        let path = key(path);
        path == "/"
            || self
                .state
                .lock()
                .map(|state| state.is_file(&path) || state.has_children(&path))
                .unwrap_or(false)
    }

    fn get_dir(&self, path: &str) -> TreeDir {
        let prefix = dir_prefix(&key(path));
        let mut dir = TreeDir::default();
        let Ok(state) = self.state.lock() else {
            return dir;
        };
        for k in state.files.keys() {
            let Some(rest) = k.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((sub, _)) => {
                    if !dir.subdirs.iter().any(|d| d == sub) {
                        dir.subdirs.push(sub.to_owned());
                    }
                },
                None => dir.subfiles.push(rest.to_owned()),
            }
        }
        dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_changes_in_order() {
        let tree = MemoryTree::new().with_file("/seed.txt", "s");
        tree.create("/a/b.txt", b"hello").unwrap();
        tree.overwrite("/seed.txt", b"xy").unwrap();
        tree.rename("/a", "/c").unwrap();
        tree.delete("/seed.txt").unwrap();

        let log: Vec<String> = tree.changes().iter().map(ToString::to_string).collect();
        assert_eq!(
            log,
            vec![
                "CREATE /a/b.txt (5 bytes)",
                "UPDATE /seed.txt (2 bytes)",
                "RENAME /a => /c",
                "DELETE /seed.txt",
            ]
        );
        assert_eq!(tree.paths(), vec!["/c/b.txt".to_string()]);
    }

    #[test]
    fn test_directories_are_implicit() {
        let tree = MemoryTree::new()
            .with_file("/src/lib.rs", "")
            .with_file("/src/bin/main.rs", "")
            .with_file("/src/bin/other.rs", "");

        assert!(tree.exists("/"));
        assert!(tree.exists("/src/bin"));
        assert!(!tree.exists("/sr"));
        assert_eq!(
            tree.get_dir("/src"),
            TreeDir {
                subdirs: vec!["bin".into()],
                subfiles: vec!["lib.rs".into()],
            }
        );
        assert_eq!(tree.get_dir("/").subdirs, vec!["src".to_string()]);
    }

    #[test]
    fn test_rejects_invalid_mutations() {
        let tree = MemoryTree::new().with_file("/a", "1");
        assert!(tree.create("/a", b"2").is_err());
        assert!(tree.overwrite("/missing", b"2").is_err());
        assert!(tree.delete("/missing").is_err());
        assert!(tree.changes().is_empty());
        assert_eq!(tree.file("a"), Some(b"1".to_vec()));
    }
}
