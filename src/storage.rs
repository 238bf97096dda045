//! Storage helpers for document content on disk.
//!
//! Document locations are URLs. `s3://bucket/key` objects are read from a
//! local mirror laid out as `{storage_dir}/{bucket}/{key}`; `file://` URLs and
//! bare paths are used directly.

use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use url::Url;

/// Errors from resolving or reading stored documents.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Unsupported location scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid location '{location}': {message}")]
    InvalidLocation { location: String, message: String },

    #[error("Document not found at {0}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolves document locations to files under a storage root.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    root: PathBuf,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a location to a local file path. Does not check the file exists.
    pub fn resolve(&self, location: &str) -> Result<PathBuf, StorageError> {
        if !location.contains("://") {
            return Ok(PathBuf::from(location));
        }

        let url = Url::parse(location).map_err(|e| StorageError::InvalidLocation {
            location: location.to_string(),
            message: e.to_string(),
        })?;

        match url.scheme() {
            "file" => url.to_file_path().map_err(|_| StorageError::InvalidLocation {
                location: location.to_string(),
                message: "not a valid file path".to_string(),
            }),
            "s3" => {
                let bucket = url.host_str().filter(|b| !b.is_empty()).ok_or_else(|| {
                    StorageError::InvalidLocation {
                        location: location.to_string(),
                        message: "missing bucket".to_string(),
                    }
                })?;
                let key = object_key(location);
                // Decoded keys must stay relative to the bucket directory.
                let key_path = Path::new(&key);
                if key.is_empty()
                    || !key_path
                        .components()
                        .all(|c| matches!(c, Component::Normal(_)))
                {
                    return Err(StorageError::InvalidLocation {
                        location: location.to_string(),
                        message: "invalid object key".to_string(),
                    });
                }
                Ok(self.root.join(bucket).join(key))
            }
            other => Err(StorageError::UnsupportedScheme(other.to_string())),
        }
    }

    /// Resolve a location and confirm the file exists.
    pub fn locate(&self, location: &str) -> Result<PathBuf, StorageError> {
        let path = self.resolve(location)?;
        if path.is_file() {
            Ok(path)
        } else {
            Err(StorageError::NotFound(path))
        }
    }

    /// Read the stored bytes for a location.
    pub fn read(&self, location: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.locate(location)?;
        Ok(std::fs::read(path)?)
    }
}

/// The object key of a location: the path after the bucket for `s3://`
/// URLs, the path for other URLs, and the location itself for bare paths.
///
/// `s3://bucket/input/w2.pdf` has key `input/w2.pdf`.
pub fn object_key(location: &str) -> String {
    match Url::parse(location) {
        Ok(url) if location.contains("://") => {
            let path = url.path().trim_start_matches('/');
            urlencoding::decode(path)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| path.to_string())
        }
        _ => location.to_string(),
    }
}

/// Detect a MIME type from content, falling back to the file extension.
pub fn detect_mime_type(path: &Path, content: &[u8]) -> String {
    if let Some(kind) = infer::get(content) {
        return kind.mime_type().to_string();
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "tif" | "tiff" => "image/tiff",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_resolve_s3_location() {
        let store = DocumentStore::new("/srv/mirror");
        assert_eq!(
            store.resolve("s3://bucket/input/w2.pdf").unwrap(),
            PathBuf::from("/srv/mirror/bucket/input/w2.pdf")
        );
        assert_eq!(
            store.resolve("s3://bucket/input/my%20scan.png").unwrap(),
            PathBuf::from("/srv/mirror/bucket/input/my scan.png")
        );
    }

    #[test]
    fn test_resolve_rejects_bad_locations() {
        let store = DocumentStore::new("/srv/mirror");
        assert!(matches!(
            store.resolve("s3://bucket/"),
            Err(StorageError::InvalidLocation { .. })
        ));
        assert!(matches!(
            store.resolve("s3://bucket/a/..%2F..%2Fetc/passwd"),
            Err(StorageError::InvalidLocation { .. })
        ));
        assert!(matches!(
            store.resolve("s3://bucket/%2Fetc%2Fpasswd"),
            Err(StorageError::InvalidLocation { .. })
        ));
        assert!(store
            .resolve("s3://bucket/a/../../etc/passwd")
            .unwrap()
            .starts_with("/srv/mirror/bucket"));
        assert!(matches!(
            store.resolve("https://example.com/a.pdf"),
            Err(StorageError::UnsupportedScheme(s)) if s == "https"
        ));
    }

    #[test]
    fn test_resolve_file_and_bare_paths() {
        let store = DocumentStore::new("/srv/mirror");
        assert_eq!(
            store.resolve("file:///tmp/scan.png").unwrap(),
            PathBuf::from("/tmp/scan.png")
        );
        assert_eq!(
            store.resolve("scans/scan.png").unwrap(),
            PathBuf::from("scans/scan.png")
        );
    }

    #[test]
    fn test_object_key() {
        assert_eq!(object_key("s3://bucket/input/w2.pdf"), "input/w2.pdf");
        assert_eq!(object_key("file:///tmp/a.png"), "tmp/a.png");
        assert_eq!(object_key("local/a.png"), "local/a.png");
    }

    #[test]
    fn test_read_and_locate() {
        let dir = tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        std::fs::create_dir_all(dir.path().join("bucket/input")).unwrap();
        std::fs::write(dir.path().join("bucket/input/a.txt"), b"hello").unwrap();

        assert_eq!(store.read("s3://bucket/input/a.txt").unwrap(), b"hello");
        assert!(matches!(
            store.locate("s3://bucket/input/missing.txt"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_detect_mime_type() {
        let png_magic = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_mime_type(Path::new("x.bin"), &png_magic), "image/png");
        assert_eq!(detect_mime_type(Path::new("x.pdf"), b""), "application/pdf");
        assert_eq!(detect_mime_type(Path::new("x.TXT"), b"plain"), "text/plain");
        assert_eq!(
            detect_mime_type(Path::new("x"), b"plain"),
            "application/octet-stream"
        );
    }
}
