//! Directory-backed storage backend.

use std::fmt::Write as _;
use std::fs;
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{CartStorage, StorageError};

/// Stores each key as a file in a directory.
///
/// Keys are escaped into portable file names. Writes land in a temporary
/// file first and are renamed over the target, so a reader sees either the
/// previous value or the new one, never a truncated file.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir` as the backing directory. It is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The backing directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidKey` for an empty key.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey("key must not be empty".to_string()));
        }
        Ok(self.dir.join(format!("{}.json", escape_key(key))))
    }
}

/// Escape every byte outside `[A-Za-z0-9_-]` as `%XX`.
fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            out.push(char::from(byte));
        } else {
            let _ = write!(out, "%{byte:02X}");
        }
    }
    out
}

impl CartStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;

        let tmp = path.with_extension("json.tmp");
        if let Err(e) = replace_via(&tmp, &path, value) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        debug!(path = %path.display(), bytes = value.len(), "Wrote storage slot");
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Write `value` to `tmp`, flush it, and move it over `path`.
fn replace_via(tmp: &Path, path: &Path, value: &str) -> std::io::Result<()> {
    let mut file = fs::File::create(tmp)?;
    file.write_all(value.as_bytes())?;
    file.sync_all()?;
    drop(file);
    fs::rename(tmp, path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_key() {
        assert_eq!(escape_key("@RocketShoes:cart"), "%40RocketShoes%3Acart");
        assert_eq!(escape_key("plain-key_1"), "plain-key_1");
        assert_eq!(escape_key("../up"), "%2E%2E%2Fup");
    }

    #[test]
    fn test_empty_key_rejected() {
        let storage = FileStorage::new("/nonexistent");
        assert!(matches!(
            storage.get_item(""),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_roundtrip_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested"));

        assert!(storage.get_item("@RocketShoes:cart").unwrap().is_none());

        storage.set_item("@RocketShoes:cart", "[]").unwrap();
        storage.set_item("@RocketShoes:cart", r#"[{"id":1}]"#).unwrap();
        assert_eq!(
            storage.get_item("@RocketShoes:cart").unwrap().as_deref(),
            Some(r#"[{"id":1}]"#)
        );

        let leftovers: Vec<_> = fs::read_dir(storage.dir())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1, "temporary file should be renamed away");

        storage.remove_item("@RocketShoes:cart").unwrap();
        storage.remove_item("@RocketShoes:cart").unwrap();
        assert!(storage.get_item("@RocketShoes:cart").unwrap().is_none());
    }

    #[test]
    fn test_failed_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        // A non-empty directory where the slot file belongs makes the rename fail.
        let blocker = dir.path().join("cart.json");
        fs::create_dir(&blocker).unwrap();
        fs::write(blocker.join("keep"), "x").unwrap();

        assert!(storage.set_item("cart", "[]").is_err());
        assert!(!dir.path().join("cart.json.tmp").exists());
        assert!(blocker.is_dir());
    }
}
