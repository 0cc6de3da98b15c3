use crate::error_handling::types::StorageError;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem-backed store for per-session authentication state.
///
/// Layout under the root directory:
/// - `<root>/<name>/` — credential namespace handed to the bridge process for
///   session `<name>`; its contents are opaque to this crate.
/// - `<root>/<name>.png` — last rendered QR snapshot for `<name>`.
///
/// Namespaces are keyed by session name and never shared, so two sessions can
/// never race over the same stored credentials.
pub struct CredentialStore {
    root: PathBuf,
}

impl CredentialStore {
    /// Opens the store rooted at `root`, creating the directory if needed.
    pub fn new(root: &Path) -> Result<Self, StorageError> {
        if !root.exists() {
            info!("Creating sessions directory {}", root.display());
            fs::create_dir_all(root)?;
        }
        Ok(CredentialStore {
            root: root.to_path_buf(),
        })
    }

    /// Rejects names that would escape the root or collide with snapshots.
    pub fn validate_name(name: &str) -> Result<(), StorageError> {
        if name.is_empty() {
            return Err(StorageError::InvalidName("empty name".to_string()));
        }
        if name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(StorageError::InvalidName(format!(
                "{} contains path separators",
                name
            )));
        }
        if name.starts_with('.') {
            return Err(StorageError::InvalidName(format!(
                "{} starts with a dot",
                name
            )));
        }
        Ok(())
    }

    /// Returns the credential namespace directory for `name`, creating it on
    /// first use.
    pub fn namespace_dir(&self, name: &str) -> Result<PathBuf, StorageError> {
        Self::validate_name(name)?;
        let dir = self.root.join(name);
        if !dir.exists() {
            debug!("Creating credential namespace for {}", name);
            fs::create_dir_all(&dir)?;
        }
        Ok(dir)
    }

    /// Enumerates the session names with a persisted credential namespace.
    ///
    /// Sorted so boot-time restoration is deterministic.
    pub fn list_namespaces(&self) -> Result<Vec<String>, StorageError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if Self::validate_name(name).is_ok() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Persists the rendered QR image for `name`, replacing any prior one.
    pub fn save_qr_snapshot(&self, name: &str, png: &[u8]) -> Result<(), StorageError> {
        Self::validate_name(name)?;
        fs::write(self.snapshot_path(name), png)?;
        Ok(())
    }

    /// Loads the last QR snapshot for `name`.
    pub fn load_qr_snapshot(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        Self::validate_name(name)?;
        let path = self.snapshot_path(name);
        if !path.exists() {
            return Err(StorageError::NotFound(format!(
                "no QR snapshot for {}",
                name
            )));
        }
        Ok(fs::read(path)?)
    }

    /// Removes the stale QR snapshot for `name`, if any.
    pub fn remove_qr_snapshot(&self, name: &str) -> Result<(), StorageError> {
        Self::validate_name(name)?;
        let path = self.snapshot_path(name);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Purges the credential namespace and snapshot for `name`. Idempotent.
    pub fn remove_namespace(&self, name: &str) -> Result<(), StorageError> {
        Self::validate_name(name)?;
        let dir = self.root.join(name);
        if dir.exists() {
            info!("Purging credential namespace for {}", name);
            fs::remove_dir_all(dir)?;
        }
        self.remove_qr_snapshot(name)
    }

    fn snapshot_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.png", name))
    }
}
