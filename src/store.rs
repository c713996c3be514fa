//! The password store file
//!
//! `SecretStore` ties a file path to a `Cipher`. Loading and saving always
//! move the whole store; there is no append or in-place update. Saving
//! writes a sibling temp file and renames it over the target, so the store
//! on disk is always either the old one or the new one, never a partial
//! file.
//!
//! There is no locking. Callers sharing one store across threads or
//! processes must serialize `load`/`save` themselves.

use crate::binio::{BinReader, BinWriter};
use crate::cipher::Cipher;
use crate::error::{ErrorCategory, ErrorKind, Result, StoreError};
use crate::record::{self, Entry};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::debug;
use zeroize::Zeroizing;

pub struct SecretStore<C> {
    path: PathBuf,
    cipher: C,
}

impl<C: Cipher> SecretStore<C> {
    pub fn new(path: impl Into<PathBuf>, cipher: C) -> Self {
        Self {
            path: path.into(),
            cipher,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn cipher(&self) -> &C {
        &self.cipher
    }

    /// True if the store file is present. Contents are not validated.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read and decode the whole store.
    pub fn load(&self) -> Result<Vec<Entry>> {
        let file = File::open(&self.path)
            .map_err(|e| StoreError::io(format!("failed to open {}", self.path.display()), e))?;
        let mut reader = BinReader::new(BufReader::new(file));
        let entries = record::read_entries(&mut reader)
            .map_err(|e| e.with_context(format!("corrupt store {}", self.path.display())))?;
        debug!(path = %self.path.display(), entries = entries.len(), "loaded store");
        Ok(entries)
    }

    /// Like `load`, but an absent file is an empty store.
    pub fn load_or_empty(&self) -> Result<Vec<Entry>> {
        if !self.exists() {
            debug!(path = %self.path.display(), "no store file yet");
            return Ok(Vec::new());
        }
        self.load()
    }

    /// Replace the store with `entries` (atomically).
    ///
    /// 1. Encode into a tempfile in the target's directory
    /// 2. Flush and fsync
    /// 3. Restrict permissions to the owner (Unix)
    /// 4. Rename over the target
    pub fn save(&self, entries: &[Entry]) -> Result<()> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut temp_file = tempfile::NamedTempFile::new_in(dir).map_err(|e| {
            StoreError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to create tempfile in {}", dir.display()),
                e,
            )
        })?;

        {
            let mut writer = BinWriter::new(BufWriter::new(temp_file.as_file_mut()));
            record::write_entries(&mut writer, entries)?;
            writer.flush()?;
        }
        // fsync() such that the rename later, if it succeeds, will always
        // point to a complete file.
        temp_file.as_file().sync_all().map_err(|e| {
            StoreError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                "failed to sync file prior to rename",
                e,
            )
        })?;

        #[cfg(unix)]
        {
            use std::fs::Permissions;
            use std::os::unix::fs::PermissionsExt;
            temp_file
                .as_file()
                .set_permissions(Permissions::from_mode(0o600))
                .map_err(|e| {
                    StoreError::with_kind_and_source(
                        ErrorCategory::Internal,
                        ErrorKind::Io,
                        "failed to set tempfile permissions",
                        e,
                    )
                })?;
        }

        temp_file.persist(&self.path).map_err(|e| {
            StoreError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("failed to rename to target file {}", self.path.display()),
                e,
            )
        })?;
        debug!(path = %self.path.display(), entries = entries.len(), "saved store");
        Ok(())
    }

    /// Encrypt `plaintext` under `key` into an entry ready to be stored.
    pub fn seal(&self, name: &str, plaintext: &str, key: &str) -> Result<Entry> {
        let value = self.cipher.encrypt(plaintext, key)?;
        Ok(Entry::new(name, value))
    }

    /// Decrypt an entry's value. A wrong key fails with
    /// `ErrorKind::CipherMismatch`.
    pub fn reveal(&self, entry: &Entry, key: &str) -> Result<Zeroizing<String>> {
        self.cipher
            .decrypt(&entry.value, key)
            .map_err(|e| e.with_context(format!("cannot reveal '{}'", entry.name)))
    }

    /// Check `key` against the first entry. An empty store accepts any key.
    pub fn verify_key(&self, entries: &[Entry], key: &str) -> Result<()> {
        match entries.first() {
            Some(entry) => self.reveal(entry, key).map(drop),
            None => Ok(()),
        }
    }
}

/// Index of the first entry called `name`.
pub fn find(entries: &[Entry], name: &str) -> Result<usize> {
    entries.iter().position(|e| e.name == name).ok_or_else(|| {
        StoreError::with_kind(
            ErrorCategory::User,
            ErrorKind::EntryNotFound,
            format!("no entry named '{name}'"),
        )
    })
}
