//! Workspace root and file-existence probing.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::metadata::MetadataRegistry;
use crate::models::LocalComponent;

/// Answers whether a path exists on disk.
pub trait FileProbe: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
}

/// [`FileProbe`] backed by the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl FileProbe for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// The project directory components are written into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a workspace-relative path.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// `path` relative to the root. Relative paths are taken as already
    /// relative to the root. Absolute paths are compared against the root
    /// after resolving `.`/`..`, symlinks and the current directory, so a
    /// root of `.` matches an absolute path into the current directory.
    /// Paths outside the workspace are returned unchanged.
    pub fn relative(&self, path: &Path) -> PathBuf {
        if path.is_relative() {
            return path.to_path_buf();
        }
        if let Ok(rel) = path.strip_prefix(&self.root) {
            return rel.to_path_buf();
        }
        let root = normalize(&self.root);
        normalize(path)
            .strip_prefix(&root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.to_path_buf())
    }

    /// Best-effort component for a source file or metadata directory.
    ///
    /// A file maps to its type by extension, a directory with no extension
    /// to a type-only component by directory name. Anything else yields a
    /// component with an empty type named after the bare file name.
    pub fn component_for_path(&self, registry: &dyn MetadataRegistry, path: &Path) -> LocalComponent {
        let relative = self.relative(path);
        let dir = relative
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let base = relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match relative.extension() {
            Some(ext) => {
                let ext = format!(".{}", ext.to_string_lossy());
                if let Some(info) = registry.lookup_by_extension(&ext) {
                    let stem = relative
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    return LocalComponent::new(stem, info.type_name.as_str(), dir);
                }
            }
            None => {
                if let Some(info) = registry.lookup_by_directory(&base) {
                    return LocalComponent::type_only(info.type_name.as_str());
                }
            }
        }

        debug!(path = %relative.display(), "no metadata type for path");
        LocalComponent::new(base, String::new(), dir)
    }
}

/// Canonical form of `path`. A missing tail is appended to the canonical
/// form of its nearest existing ancestor.
fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => normalize(parent).join(name),
        _ => std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
    }
}
