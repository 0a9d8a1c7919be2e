//! Flat-file URI catalog support for schema location resolution
//!
//! Parses plain-text catalogs mapping URN-based schema locations (like those
//! used in DITA bundles) to local file paths, so external schema references
//! resolve without network access.
//!
//! # Supported directives
//!
//! - `-- comment` - lines starting with `--` are ignored
//! - `BASE "<path>"` - sets the base path applied to subsequent URI entries
//! - `URI "<urn>" "<local-path>"` - maps a URN to a local path
//!
//! # Example
//!
//! ```text
//! -- DITA 1.3 technical content
//! BASE "../../technicalContent/"
//! URI "urn:oasis:names:tc:dita:xsd:topic.xsd" "xsd1.3/topic.xsd"
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use log::{debug, warn};
use percent_encoding::percent_decode_str;

use crate::error::{Error, Result};

/// Prefix stripped from `BASE` paths: catalogs are authored relative to a
/// directory two levels deeper than the one the dump tool resolves from.
const BASE_STRIP_PREFIX: &str = "../../";

/// Flat-file URI catalog for resolving schema locations
#[derive(Debug, Clone, Default)]
pub struct UriCatalog {
    /// URN to absolute local path mappings, keyed by the literal URN text
    uri_mappings: HashMap<String, String>,
}

impl UriCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a catalog from a file
    ///
    /// Malformed lines (fewer quoted fields than the directive needs) are
    /// skipped, not errors: catalogs may carry directives this resolver does
    /// not understand.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let catalog_dir = path.parent().map(|p| p.to_path_buf()).unwrap_or_default();

        let content = fs::read_to_string(path).map_err(|e| {
            Error::Resource(format!("failed to read catalog '{}': {}", path.display(), e))
        })?;

        let mut catalog = Self::new();
        catalog.parse(&content, &catalog_dir);

        Ok(catalog)
    }

    /// Parse catalog content line by line
    fn parse(&mut self, content: &str, catalog_dir: &Path) {
        let mut current_base: Option<String> = None;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with("--") {
                continue;
            }

            if line.starts_with("BASE") {
                let parts: Vec<&str> = line.split('"').collect();
                if parts.len() >= 2 {
                    let mut base = parts[1].to_string();
                    if let Some(stripped) = base.strip_prefix(BASE_STRIP_PREFIX) {
                        base = stripped.to_string();
                    }
                    current_base = Some(base);
                } else {
                    warn!("skipping malformed BASE line: {}", line);
                }
            } else if line.starts_with("URI") {
                // Fields are the 2nd and 4th double-quoted tokens
                let parts: Vec<&str> = line.split('"').collect();
                if parts.len() >= 4 {
                    let urn = parts[1];
                    let local_path = parts[3];

                    let full_path = match &current_base {
                        Some(base) => catalog_dir.join(base).join(local_path),
                        None => catalog_dir.join(local_path),
                    };

                    self.uri_mappings
                        .insert(urn.to_string(), canonicalize_lossy(&full_path));
                } else {
                    warn!("skipping malformed URI line: {}", line);
                }
            }
            // Other directives (DELEGATE, SYSTEM, ...) are not needed here
        }
    }

    /// Resolve a URI to a local path
    ///
    /// The input is percent-decoded before lookup; if the decoded form is
    /// unmapped the raw form is tried. Unmapped URIs are returned unchanged:
    /// they are assumed to already be resolvable by the caller.
    pub fn resolve(&self, uri: &str) -> String {
        let decoded = percent_decode_str(uri).decode_utf8_lossy();

        if let Some(path) = self.uri_mappings.get(decoded.as_ref()) {
            return path.clone();
        }
        if let Some(path) = self.uri_mappings.get(uri) {
            return path.clone();
        }

        debug!("catalog pass-through for unmapped URI: {}", uri);
        uri.to_string()
    }

    /// Check if this catalog has no mappings
    pub fn is_empty(&self) -> bool {
        self.uri_mappings.is_empty()
    }

    /// Get the number of mappings
    pub fn len(&self) -> usize {
        self.uri_mappings.len()
    }
}

/// Canonicalize a path to an absolute string, resolving symlinks and `..`
/// segments. Falls back to a lexical cleanup when the target does not exist
/// yet, so catalogs can be parsed independently of the files they point at.
fn canonicalize_lossy(path: &Path) -> String {
    if let Ok(canonical) = fs::canonicalize(path) {
        return canonical.to_string_lossy().to_string();
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut cleaned = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                cleaned.pop();
            }
            Component::CurDir => {}
            other => cleaned.push(other),
        }
    }
    cleaned.to_string_lossy().to_string()
}
