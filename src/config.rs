//! Store settings
//!
//! Every field has a default so a bare `saltypass` invocation works in any
//! directory. The CLI fills these from flags and `SALTYPASS_*` environment
//! variables.

use crate::cipher::SecretboxCipher;
use crate::secretcrypt::ScryptCost;
use crate::store::SecretStore;
use std::path::PathBuf;

/// File name used when no store path is configured, relative to the
/// working directory.
pub const DEFAULT_STORE_FILE: &str = "secure.dat";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Location of the store file.
    pub path: PathBuf,

    /// scrypt cost used when sealing new values. Existing values carry
    /// their own cost and open regardless of this setting.
    pub cost: ScryptCost,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORE_FILE),
            cost: ScryptCost::default(),
        }
    }
}

impl StoreConfig {
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_cost(mut self, cost: ScryptCost) -> Self {
        self.cost = cost;
        self
    }

    /// Store handle over the configured file using the secretbox cipher.
    pub fn open(&self) -> SecretStore<SecretboxCipher> {
        SecretStore::new(self.path.clone(), SecretboxCipher::new(self.cost))
    }
}
