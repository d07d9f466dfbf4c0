use std::fmt;
use std::path::{Path, PathBuf};

use crate::{VfsError, VfsResult};

const ROOT: &str = ".";

/// A root-relative, lexically normalized path.
///
/// This is the key every [`StorageBackend`](crate::StorageBackend) operates
/// on. The root directory itself is a distinguished value (see
/// [`ResolvedPath::is_root`]) rather than an empty string. A path that
/// starts with `..` segments only exists when a non-enforcing facade
/// tolerated an escape; [`ResolvedPath::escapes_root`] reports it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResolvedPath {
    relative: String,
}

impl ResolvedPath {
    /// The root boundary itself.
    #[must_use]
    pub fn root() -> Self {
        Self {
            relative: ROOT.to_owned(),
        }
    }

    fn from_normalized(relative: String) -> Self {
        if relative.is_empty() || relative == ROOT {
            Self::root()
        } else {
            Self { relative }
        }
    }

    /// True when this path designates the root boundary.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.relative == ROOT
    }

    /// True when the path leaves the root through leading `..` segments.
    #[must_use]
    pub fn escapes_root(&self) -> bool {
        escapes(&self.relative)
    }

    /// The root-relative path. The root renders as `.`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.relative
    }

    /// Iterate the path segments. The root has none.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.relative
            .split('/')
            .filter(|s| !s.is_empty() && *s != ROOT)
    }

    /// The final segment, if any.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.segments().last()
    }

    /// The containing directory. `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(match self.relative.rsplit_once('/') {
            Some((parent, _)) => Self::from_normalized(parent.to_owned()),
            None => Self::root(),
        })
    }

    /// Join this path onto a host directory.
    ///
    /// Does not re-check containment; callers holding a path that escapes
    /// the root must reject it before reaching real storage.
    #[must_use]
    pub fn to_host_path(&self, root: &Path) -> PathBuf {
        let mut host = root.to_path_buf();
        for segment in self.segments() {
            if segment == ".." {
                host.pop();
            } else {
                host.push(segment);
            }
        }
        host
    }

    /// The absolute form used by a virtual tree (`/a/b`, root is `/`).
    ///
    /// Leading `..` segments are clamped at the abstract root, which is how
    /// a tolerated escape gets re-rooted.
    #[must_use]
    pub fn to_tree_path(&self) -> String {
        let inside: Vec<&str> = self.segments().filter(|s| *s != "..").collect();
        format!("/{}", inside.join("/"))
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative)
    }
}

impl AsRef<str> for ResolvedPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

fn escapes(relative: &str) -> bool {
    relative == ".." || relative.starts_with("../")
}

/// Lexically normalize a `/`-separated path.
///
/// Repeated separators and `.` segments collapse, `..` cancels the previous
/// segment. For relative paths, `..` segments that cannot be cancelled are
/// kept at the front. For absolute paths they are dropped (`/..` is `/`).
/// The filesystem is never consulted.
#[must_use]
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {},
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                },
                _ if absolute => {},
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{joined}")
    } else if joined.is_empty() {
        ROOT.to_owned()
    } else {
        joined
    }
}

/// Join `path` onto `base` and normalize. An absolute `path` replaces `base`.
#[must_use]
pub fn join(base: &str, path: &str) -> String {
    if path.starts_with('/') || base.is_empty() {
        normalize(path)
    } else {
        normalize(&format!("{base}/{path}"))
    }
}

/// Check whether `candidate` lies inside (or is) `root`, lexically.
#[must_use]
pub fn is_within(root: &Path, candidate: &Path) -> bool {
    let root = normalize(&root.to_string_lossy());
    let candidate = normalize(&candidate.to_string_lossy());
    Path::new(&candidate).starts_with(Path::new(&root))
}

/// Build the root-relative path for `input` as seen from `cwd`.
///
/// An absolute input is never trusted as a host path: it is re-rooted at
/// the root boundary and the cwd is ignored. Like any absolute path it
/// clamps at its root, so `/../a` is `a`. A relative input is joined onto
/// `cwd` (itself root-relative).
#[must_use]
pub fn build_path(cwd: &str, input: &str) -> String {
    if input.starts_with('/') {
        let rerooted = normalize(input);
        match rerooted.trim_start_matches('/') {
            "" => ROOT.to_owned(),
            inside => inside.to_owned(),
        }
    } else {
        join(cwd, input)
    }
}

/// Resolve `input` against `root` and `cwd`.
///
/// When the result escapes the root it is rejected with
/// [`VfsError::PathEscape`] if `enforce` is set or if `root` is the host
/// root `/` (there is nothing above it to escape to). Otherwise the escape
/// is returned as-is for the caller to handle.
///
/// # Errors
///
/// Returns [`VfsError::PathEscape`] as described above.
pub fn resolve(root: &Path, cwd: &str, enforce: bool, input: &str) -> VfsResult<ResolvedPath> {
    let built = build_path(cwd, input);
    let target = join(&root.to_string_lossy(), &built);

    // Joining onto `/` clamps, so leading `..` is checked on the relative form too.
    let escaped = escapes(&built) || !is_within(root, Path::new(&target));
    if escaped && (enforce || root == Path::new("/")) {
        return Err(VfsError::PathEscape {
            input: input.to_owned(),
            target,
        });
    }

    Ok(ResolvedPath::from_normalized(built))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_segments() {
        assert_eq!(normalize("a//b/./c/"), "a/b/c");
        assert_eq!(normalize("a/b/../c"), "a/c");
        assert_eq!(normalize("./"), ".");
        assert_eq!(normalize(""), ".");
    }

    #[test]
    fn test_normalize_keeps_leading_parent_for_relative() {
        assert_eq!(normalize("../a/../../b"), "../../b");
        assert_eq!(normalize("a/../.."), "..");
    }

    #[test]
    fn test_normalize_absolute_clamps_at_root() {
        assert_eq!(normalize("/../etc"), "/etc");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("//x///y"), "/x/y");
    }

    #[test]
    fn test_join() {
        assert_eq!(join("a/b", "c"), "a/b/c");
        assert_eq!(join("a/b", "../c"), "a/c");
        assert_eq!(join("a", "/c"), "/c");
        assert_eq!(join(".", "x"), "x");
    }

    #[test]
    fn test_is_within() {
        let root = Path::new("/proj");
        assert!(is_within(root, Path::new("/proj")));
        assert!(is_within(root, Path::new("/proj/a/../b")));
        assert!(!is_within(root, Path::new("/proj/../etc")));
        assert!(!is_within(root, Path::new("/project")));
    }

    #[test]
    fn test_build_path_reroots_absolute_input() {
        assert_eq!(build_path("sub", "/a/b.txt"), "a/b.txt");
        assert_eq!(build_path("sub", "/"), ".");
        assert_eq!(build_path("sub", "c.txt"), "sub/c.txt");
    }

    #[test]
    fn test_traversal_blocked() {
        let res = resolve(Path::new("/proj"), ".", true, "../../etc/passwd");
        match res {
            Err(VfsError::PathEscape { input, target }) => {
                assert_eq!(input, "../../etc/passwd");
                assert_eq!(target, "/etc/passwd");
            },
            other => panic!("expected escape, got {other:?}"),
        }
    }

    #[test]
    fn test_parent_from_subdirectory_stays_inside() {
        let res = resolve(Path::new("/proj"), "sub", true, "../file.txt").unwrap();
        assert_eq!(res.as_str(), "file.txt");
    }

    #[test]
    fn test_absolute_input_clamps_at_root() {
        assert_eq!(build_path("sub", "/../a"), "a");
        assert_eq!(build_path("sub", "/.."), ".");

        let res = resolve(Path::new("/proj"), "sub", true, "/../secret").unwrap();
        assert_eq!(res.as_str(), "secret");
        assert!(!res.escapes_root());
    }

    #[test]
    fn test_resolve_checks_containment_against_root() {
        let root = Path::new("/proj");
        let inside = resolve(root, "a/b", true, "../../c").unwrap();
        assert!(is_within(root, &inside.to_host_path(root)));

        let res = resolve(root, "a", true, "../../c");
        match res {
            Err(VfsError::PathEscape { target, .. }) => {
                assert!(!is_within(root, Path::new(&target)));
            },
            other => panic!("expected escape, got {other:?}"),
        }
    }

    #[test]
    fn test_escape_tolerated_without_enforcement() {
        let res = resolve(Path::new("/proj"), ".", false, "../other/x").unwrap();
        assert!(res.escapes_root());
        assert_eq!(res.to_tree_path(), "/other/x");
    }

    #[test]
    fn test_host_root_never_tolerates_escape() {
        let res = resolve(Path::new("/"), ".", false, "../x");
        assert!(matches!(res, Err(VfsError::PathEscape { .. })));
    }

    #[test]
    fn test_root_sentinel() {
        let res = resolve(Path::new("/proj"), "a", true, "..").unwrap();
        assert!(res.is_root());
        assert_eq!(res.to_tree_path(), "/");
        assert_eq!(res.to_host_path(Path::new("/proj")), Path::new("/proj"));
        assert_eq!(res.segments().count(), 0);
    }

    #[test]
    fn test_parent_and_file_name() {
        let res = resolve(Path::new("/proj"), ".", true, "a/b/c.json").unwrap();
        assert_eq!(res.file_name(), Some("c.json"));
        assert_eq!(res.parent().unwrap().as_str(), "a/b");
        let top = resolve(Path::new("/proj"), ".", true, "c.json").unwrap();
        assert!(top.parent().unwrap().is_root());
        assert!(ResolvedPath::root().parent().is_none());
    }

    #[test]
    fn test_equal_after_normalization() {
        let a = resolve(Path::new("/proj"), ".", true, "a/./b/../c").unwrap();
        let b = resolve(Path::new("/proj"), "a", true, "c").unwrap();
        assert_eq!(a, b);
    }
}
