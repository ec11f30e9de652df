//! Working-directory sandbox for client-supplied paths.
//!
//! Resolution is two-step: a textual pass strips `..` and leading separators,
//! then the joined path is canonicalised and must stay under the canonical
//! working root. The canonical containment check is the authority; the
//! textual pass only keeps obviously hostile input from reaching the
//! filesystem.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::errors::DiscoveryError;

/// A fixed, canonical working root plus the rules for resolving paths under it.
#[derive(Debug, Clone)]
pub struct PathSandbox {
    root: PathBuf,
}

impl PathSandbox {
    /// Canonicalise `root` once and use it as the sandbox boundary.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, DiscoveryError> {
        let root = root.as_ref();
        let canonical = fs::canonicalize(root).map_err(|source| DiscoveryError::Io {
            path: root.to_path_buf(),
            source,
        })?;
        if !canonical.is_dir() {
            return Err(DiscoveryError::NotADirectory { path: canonical });
        }
        Ok(Self { root: canonical })
    }

    /// The canonical working root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Strip every `..` occurrence and any leading separators.
    pub fn sanitize(raw: &str) -> String {
        raw.replace("..", "")
            .trim_start_matches(['/', '\\'])
            .to_string()
    }

    /// Resolve a client-relative path to an absolute path inside the root.
    ///
    /// An empty string resolves to the root itself. The target does not have
    /// to exist; missing trailing components are appended to the canonical
    /// form of the deepest existing ancestor.
    pub fn resolve(&self, raw: &str) -> Result<PathBuf, DiscoveryError> {
        let sanitized = Self::sanitize(raw);
        self.contain(&self.root.join(sanitized))
    }

    /// Canonicalise an already-joined (or absolute) path and reject it unless
    /// it lies under the root.
    pub fn contain(&self, candidate: &Path) -> Result<PathBuf, DiscoveryError> {
        let resolved = canonicalize_lenient(candidate);
        if !resolved.starts_with(&self.root) {
            tracing::warn!(path = %resolved.display(), "rejected path outside working root");
            return Err(DiscoveryError::AccessDenied { path: resolved });
        }
        Ok(resolved)
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalise the deepest existing ancestor and re-append the rest.
fn canonicalize_lenient(path: &Path) -> PathBuf {
    let normalized = normalize_lexically(path);
    let mut missing = Vec::new();
    let mut current = normalized.as_path();
    loop {
        match fs::canonicalize(current) {
            Ok(mut base) => {
                for name in missing.iter().rev() {
                    base.push(name);
                }
                return base;
            }
            Err(_) => match (current.parent(), current.file_name()) {
                (Some(parent), Some(name)) => {
                    missing.push(name.to_os_string());
                    current = parent;
                }
                _ => return normalized,
            },
        }
    }
}
