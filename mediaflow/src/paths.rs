//! Root-relative artifact paths.
//!
//! Every path exchanged with executors and the artifact store is a
//! slash-separated path relative to one configured project root. Only
//! [`ProjectRoot`] ever turns such a path into a filesystem path.

use crate::errors::PathEscapeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A validated, normalized, root-relative artifact path.
///
/// Normalization drops `.` segments and repeated slashes. Absolute paths,
/// Windows drive or UNC prefixes, backslashes, NUL bytes and `..` segments
/// are rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectPath(String);

impl ProjectPath {
    /// Parses an untrusted path.
    pub fn parse(raw: &str) -> Result<Self, PathEscapeError> {
        if raw.trim().is_empty() {
            return Err(PathEscapeError::new(raw, "path is empty"));
        }
        if raw.contains('\0') {
            return Err(PathEscapeError::new(raw, "path contains a NUL byte"));
        }
        if raw.contains('\\') {
            return Err(PathEscapeError::new(raw, "path must use '/' separators"));
        }
        if raw.starts_with('/') {
            return Err(PathEscapeError::new(raw, "path is absolute"));
        }
        if has_drive_prefix(raw) {
            return Err(PathEscapeError::new(raw, "path has a drive prefix"));
        }

        let mut segments = Vec::new();
        for segment in raw.split('/') {
            match segment {
                "" | "." => {}
                ".." => return Err(PathEscapeError::new(raw, "path contains a '..' segment")),
                other => segments.push(other),
            }
        }

        if segments.is_empty() {
            return Err(PathEscapeError::new(raw, "path names the project root itself"));
        }
        Ok(Self(segments.join("/")))
    }

    /// Joins a directory and a file name, validating the result.
    pub fn join(dir: &str, file_name: &str) -> Result<Self, PathEscapeError> {
        if file_name.contains('/') {
            return Err(PathEscapeError::new(file_name, "file name contains '/'"));
        }
        Self::parse(&format!("{dir}/{file_name}"))
    }

    /// Returns the normalized path string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the final segment.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Returns the extension of the final segment, if any.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        name.rfind('.')
            .filter(|&i| i > 0)
            .map(|i| &name[i + 1..])
    }

    /// Returns the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

fn has_drive_prefix(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

impl fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ProjectPath {
    type Error = PathEscapeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProjectPath> for String {
    fn from(value: ProjectPath) -> Self {
        value.0
    }
}

impl AsRef<str> for ProjectPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The single configured project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot {
    root: PathBuf,
}

impl ProjectRoot {
    /// Creates a project root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Joins a validated relative path onto the root.
    #[must_use]
    pub fn resolve(&self, path: &ProjectPath) -> PathBuf {
        path.segments().fold(self.root.clone(), |acc, seg| acc.join(seg))
    }

    /// Resolves a path and verifies that following symlinks along its
    /// deepest existing ancestor keeps it under the root.
    pub fn resolve_contained(&self, path: &ProjectPath) -> Result<PathBuf, PathEscapeError> {
        let full = self.resolve(path);
        let Ok(real_root) = self.root.canonicalize() else {
            return Ok(full);
        };

        let real = full.ancestors().find_map(|a| a.canonicalize().ok());
        if real.is_some_and(|r| !r.starts_with(&real_root)) {
            return Err(PathEscapeError::new(
                path.as_str(),
                "path resolves outside the project root",
            ));
        }
        Ok(full)
    }
}
