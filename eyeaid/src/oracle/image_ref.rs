//! References to the retinal image supplied for a run.

use crate::errors::ImageError;
use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A retinal image, either on disk or already in memory.
///
/// Cloning is cheap: in-memory bytes are shared.
#[derive(Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// An image file on disk.
    Path(PathBuf),
    /// Encoded image bytes (PNG, JPEG, ...).
    Bytes(Arc<[u8]>),
}

impl ImageRef {
    /// References an image file.
    #[must_use]
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Wraps encoded image bytes.
    #[must_use]
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(Arc::from(bytes.into()))
    }

    /// The file path, if this is an on-disk image.
    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Bytes(_) => None,
        }
    }

    /// Reads the encoded bytes.
    pub fn read_bytes(&self) -> Result<Cow<'_, [u8]>, ImageError> {
        match self {
            Self::Path(path) => std::fs::read(path)
                .map(Cow::Owned)
                .map_err(|source| ImageError::Io {
                    path: path.clone(),
                    source,
                }),
            Self::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
        }
    }

    /// Reads the encoded bytes without blocking the runtime.
    pub async fn load_bytes(&self) -> Result<Cow<'_, [u8]>, ImageError> {
        match self {
            Self::Path(path) => tokio::fs::read(path)
                .await
                .map(Cow::Owned)
                .map_err(|source| ImageError::Io {
                    path: path.clone(),
                    source,
                }),
            Self::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
        }
    }
}

impl fmt::Debug for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
        }
    }
}

impl From<PathBuf> for ImageRef {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ImageRef {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageRef {
    fn from(bytes: Vec<u8>) -> Self {
        Self::bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_bytes_are_borrowed() {
        let image = ImageRef::bytes(vec![9, 8, 7]);
        let bytes = image.read_bytes().unwrap();
        assert!(matches!(bytes, Cow::Borrowed(_)));
        assert_eq!(&*bytes, &[9, 8, 7]);
    }

    #[test]
    fn test_path_is_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"abc").unwrap();

        let image = ImageRef::path(file.path());
        assert_eq!(&*image.read_bytes().unwrap(), b"abc");
        assert_eq!(image.as_path(), Some(file.path()));
    }

    #[test]
    fn test_missing_path_is_io_error() {
        let image = ImageRef::path("/definitely/not/here.jpg");
        assert!(matches!(image.read_bytes(), Err(ImageError::Io { .. })));
    }

    #[tokio::test]
    async fn test_async_load_matches_sync_read() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"fundus").unwrap();

        let image = ImageRef::path(file.path());
        assert_eq!(&*image.load_bytes().await.unwrap(), b"fundus");

        let missing = ImageRef::path("/definitely/not/here.jpg");
        assert!(matches!(missing.load_bytes().await, Err(ImageError::Io { .. })));

        let inline = ImageRef::bytes(vec![1, 2]);
        assert!(matches!(inline.load_bytes().await.unwrap(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_debug_hides_bytes() {
        let image = ImageRef::bytes(vec![0; 2048]);
        assert_eq!(format!("{image:?}"), "Bytes(2048 bytes)");
    }
}
