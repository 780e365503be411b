//! The credential vault.
//!
//! Three named secrets with get/set/clear semantics behind [`CredentialStore`].
//! Writes are synchronous and write-through: once `set` returns `Ok`, a fresh
//! load sees the value. Values are stored in cleartext; the file backend
//! restricts the vault to its owner on Unix.
//!
//! On disk the vault is a flat TOML table:
//!
//! ```toml
//! orion_gemini_key = "..."
//! orion_github_key = "..."
//! orion_drive_id = "..."
//! ```
//!
//! Edits go through `toml_edit` so comments and unknown keys survive.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use orion_types::{CredentialName, CredentialSet};
use orion_utils::{WriteOptions, atomic_write_with_options, ensure_private_dir};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read vault at {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("vault at {} is not valid TOML: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    #[error("failed to write vault at {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("could not determine a home directory for the vault")]
    NoHome,
}

/// Get/set/clear access to named secrets.
///
/// Implementations keep an in-memory copy so `get` is infallible.
pub trait CredentialStore: Send {
    /// Empty string when unset.
    fn get(&self, name: CredentialName) -> &str;

    /// Persist and update the in-memory copy. An empty value removes the entry.
    fn set(&mut self, name: CredentialName, value: &str) -> Result<(), StoreError>;

    /// Remove every persisted entry.
    fn clear_all(&mut self) -> Result<(), StoreError>;

    /// Snapshot of all three values.
    fn snapshot(&self) -> CredentialSet {
        let mut set = CredentialSet::default();
        for name in CredentialName::ALL {
            set.set(name, self.get(name));
        }
        set
    }
}

/// Vault backed by a TOML file.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    values: CredentialSet,
}

impl FileCredentialStore {
    /// Open `~/.orion/vault.toml`.
    pub fn open_default() -> Result<Self, StoreError> {
        let path = vault_path().ok_or(StoreError::NoHome)?;
        Self::open(path)
    }

    /// Load the vault at `path`. A missing file is an empty vault.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let doc = read_document(&path)?;

        let mut values = CredentialSet::default();
        for name in CredentialName::ALL {
            if let Some(value) = doc.get(name.storage_key()).and_then(|item| item.as_str()) {
                values.set(name, value);
            }
        }

        tracing::debug!(path = %path.display(), credentials = ?values, "Loaded credential vault");
        Ok(Self { path, values })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, doc: &toml_edit::DocumentMut) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            ensure_private_dir(parent).map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        atomic_write_with_options(
            &self.path,
            doc.to_string().as_bytes(),
            WriteOptions::owner_only(),
        )
        .map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, name: CredentialName) -> &str {
        self.values.get(name)
    }

    fn set(&mut self, name: CredentialName, value: &str) -> Result<(), StoreError> {
        let mut doc = read_document(&self.path)?;
        if value.is_empty() {
            doc.remove(name.storage_key());
        } else {
            doc[name.storage_key()] = toml_edit::value(value);
        }
        self.persist(&doc)?;
        self.values.set(name, value);
        tracing::info!(credential = %name, present = !value.is_empty(), "Updated credential");
        Ok(())
    }

    fn clear_all(&mut self) -> Result<(), StoreError> {
        let mut doc = read_document(&self.path)?;
        for name in CredentialName::ALL {
            doc.remove(name.storage_key());
        }
        self.persist(&doc)?;
        self.values.clear();
        tracing::info!(path = %self.path.display(), "Wiped credential vault");
        Ok(())
    }
}

fn read_document(path: &Path) -> Result<toml_edit::DocumentMut, StoreError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
        Err(source) => {
            return Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| StoreError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// In-memory vault for tests and ephemeral sessions.
#[derive(Debug, Default, Clone)]
pub struct MemoryCredentialStore {
    values: CredentialSet,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn with(name: CredentialName, value: &str) -> Self {
        let mut values = CredentialSet::default();
        values.set(name, value);
        Self { values }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, name: CredentialName) -> &str {
        self.values.get(name)
    }

    fn set(&mut self, name: CredentialName, value: &str) -> Result<(), StoreError> {
        self.values.set(name, value);
        Ok(())
    }

    fn clear_all(&mut self) -> Result<(), StoreError> {
        self.values.clear();
        Ok(())
    }
}

#[must_use]
pub fn vault_path() -> Option<PathBuf> {
    crate::orion_dir().map(|dir| dir.join("vault.toml"))
}
