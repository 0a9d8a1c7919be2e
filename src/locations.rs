//! Schema location resolution
//!
//! Resolves `schemaLocation` values against the document that references
//! them. Only filesystem paths and `file:` URLs are supported; remote URLs
//! are rejected since the dump tool never fetches over the network.

use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{Error, Result};

/// Resolve a schema location relative to the directory of the referencing
/// document.
///
/// Absolute paths and `file:` URLs are taken as-is; anything else is joined
/// onto `base_dir`.
pub fn resolve_location(location: &str, base_dir: Option<&Path>) -> Result<PathBuf> {
    if let Ok(url) = Url::parse(location) {
        if url.scheme() == "file" {
            return url
                .to_file_path()
                .map_err(|_| Error::Resource(format!("invalid file URL: {}", location)));
        }
        // Single-letter schemes are Windows drive letters, not URLs
        if url.scheme().len() > 1 {
            return Err(Error::Resource(format!(
                "unsupported remote schema location: {}",
                location
            )));
        }
    }

    let path = Path::new(location);
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    match base_dir {
        Some(base) => Ok(base.join(path)),
        None => Ok(path.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_joined_to_base() {
        let resolved = resolve_location("types.xsd", Some(Path::new("/schemas"))).unwrap();
        assert_eq!(resolved, PathBuf::from("/schemas/types.xsd"));
    }

    #[test]
    fn test_relative_path_without_base() {
        let resolved = resolve_location("types.xsd", None).unwrap();
        assert_eq!(resolved, PathBuf::from("types.xsd"));
    }

    #[test]
    fn test_absolute_path_kept() {
        let resolved = resolve_location("/abs/types.xsd", Some(Path::new("/other"))).unwrap();
        assert_eq!(resolved, PathBuf::from("/abs/types.xsd"));
    }

    #[test]
    fn test_file_url() {
        let resolved = resolve_location("file:///abs/types.xsd", None).unwrap();
        assert_eq!(resolved, PathBuf::from("/abs/types.xsd"));
    }

    #[test]
    fn test_remote_url_rejected() {
        assert!(resolve_location("http://example.com/types.xsd", None).is_err());
    }
}
