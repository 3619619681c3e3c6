//! Request path to filesystem path mapping
//!
//! Normalization is purely lexical: segments are percent-decoded one by one,
//! `.` and empty segments are dropped and `..` removes the previous segment.
//! A `..` with nothing left to remove would leave the served root and is
//! rejected.

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// Why a request path could not be mapped under the root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveError {
    /// `..` climbs above the served root
    Traversal,
    /// Segment is not valid UTF-8 once decoded, or smuggles a separator or NUL
    InvalidSegment,
}

/// Normalized request path and its location on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Path on disk (root joined with the segments)
    pub fs_path: PathBuf,
    /// Decoded, normalized URL segments below the root
    pub segments: Vec<String>,
}

impl ResolvedPath {
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Normalized URL path, with a trailing slash for anything below the root
    pub fn url_path(&self) -> String {
        if self.segments.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", self.segments.join("/"))
        }
    }

    /// File extension, if any
    pub fn extension(&self) -> Option<&str> {
        self.fs_path.extension().and_then(|e| e.to_str())
    }
}

/// Map a request path (no query string) under `root`
pub fn resolve(root: &Path, request_path: &str) -> Result<ResolvedPath, ResolveError> {
    let mut segments: Vec<String> = Vec::new();

    for raw in request_path.split('/') {
        let segment = percent_decode_str(raw)
            .decode_utf8()
            .map_err(|_| ResolveError::InvalidSegment)?;

        if segment.contains(['/', '\\', '\0']) {
            return Err(ResolveError::InvalidSegment);
        }

        match segment.as_ref() {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(ResolveError::Traversal);
                }
            }
            name => segments.push(name.to_string()),
        }
    }

    let mut fs_path = root.to_path_buf();
    fs_path.extend(&segments);

    Ok(ResolvedPath { fs_path, segments })
}
