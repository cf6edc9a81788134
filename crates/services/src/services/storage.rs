use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const BUCKET_ORIGINAL_UPLOADS: &str = "original_uploads";
pub const BUCKET_GALLERY: &str = "gallery";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
    #[error("Object already exists: {0}")]
    AlreadyExists(String),
}

/// Flat file-backed object store. Objects live under `<root>/<bucket>/<key>`
/// and are exposed over HTTP at `/storage/<bucket>/<key>`.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
}

impl ObjectStore {
    pub fn new(root: PathBuf) -> Result<Self, StorageError> {
        for bucket in [BUCKET_ORIGINAL_UPLOADS, BUCKET_GALLERY] {
            std::fs::create_dir_all(root.join(bucket))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes a new object. Keys are single path segments; anything that
    /// could escape the bucket is rejected. Overwrites are refused so a
    /// stored upload can never be clobbered by a duplicate request.
    pub fn put(&self, bucket: &str, key: &str, bytes: &[u8]) -> Result<String, StorageError> {
        validate_segment(bucket)?;
        validate_segment(key)?;

        let path = self.root.join(bucket).join(key);
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::AlreadyExists {
                    StorageError::AlreadyExists(format!("{bucket}/{key}"))
                } else {
                    StorageError::Io(err)
                }
            })?;
        file.write_all(bytes)?;
        Ok(Self::public_url(bucket, key))
    }

    pub fn read(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        validate_segment(bucket)?;
        validate_segment(key)?;
        Ok(std::fs::read(self.root.join(bucket).join(key))?)
    }

    pub fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        validate_segment(bucket)?;
        validate_segment(key)?;
        std::fs::remove_file(self.root.join(bucket).join(key))?;
        Ok(())
    }

    pub fn public_url(bucket: &str, key: &str) -> String {
        format!("/storage/{bucket}/{key}")
    }
}

fn validate_segment(segment: &str) -> Result<(), StorageError> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains('/')
        || segment.contains('\\')
    {
        return Err(StorageError::InvalidKey(segment.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_read_and_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path().to_path_buf()).unwrap();

        let url = store
            .put(BUCKET_ORIGINAL_UPLOADS, "abc.jpg", b"jpeg bytes")
            .unwrap();
        assert_eq!(url, "/storage/original_uploads/abc.jpg");
        assert_eq!(
            store.read(BUCKET_ORIGINAL_UPLOADS, "abc.jpg").unwrap(),
            b"jpeg bytes"
        );
    }

    #[test]
    fn overwrites_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path().to_path_buf()).unwrap();

        store.put(BUCKET_GALLERY, "one.png", b"first").unwrap();
        let err = store.put(BUCKET_GALLERY, "one.png", b"second").unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
        assert_eq!(store.read(BUCKET_GALLERY, "one.png").unwrap(), b"first");
    }

    #[test]
    fn traversal_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = ObjectStore::new(dir.path().to_path_buf()).unwrap();

        for key in ["../escape", "a/b", "", "..", "a\\b"] {
            let err = store.put(BUCKET_GALLERY, key, b"x").unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "key: {key:?}");
        }
    }
}
