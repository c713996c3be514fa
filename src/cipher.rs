//! Text-in/text-out encryption of entry values

use crate::armor;
use crate::error::{ErrorCategory, ErrorKind, Result, StoreError};
use crate::secretcrypt::{self, ScryptCost};
use zeroize::Zeroizing;

/// Turns plaintext secrets into storable text and back, keyed by a master key.
///
/// The store never looks inside the ciphertext; any implementation works as
/// long as `decrypt` refuses a wrong key with `ErrorKind::CipherMismatch`
/// instead of returning garbage.
pub trait Cipher {
    fn encrypt(&self, plaintext: &str, key: &str) -> Result<String>;

    fn decrypt(&self, ciphertext: &str, key: &str) -> Result<Zeroizing<String>>;
}

/// scrypt + secretbox sealing, armored as `saltypass1:` text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretboxCipher {
    cost: ScryptCost,
}

impl SecretboxCipher {
    pub fn new(cost: ScryptCost) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> ScryptCost {
        self.cost
    }
}

impl Cipher for SecretboxCipher {
    fn encrypt(&self, plaintext: &str, key: &str) -> Result<String> {
        let sealed = secretcrypt::seal(key.as_bytes(), plaintext.as_bytes(), self.cost)
            .map_err(|e| e.with_context("encryption failed"))?;
        Ok(armor::wrap(&sealed))
    }

    fn decrypt(&self, ciphertext: &str, key: &str) -> Result<Zeroizing<String>> {
        let sealed = armor::unwrap(ciphertext).map_err(|e| e.with_context("failed to unarmor"))?;
        let mut plaintext = secretcrypt::open(key.as_bytes(), &sealed)
            .map_err(|e| e.with_context("failed to decrypt"))?;
        let bytes = std::mem::take(&mut *plaintext);
        match String::from_utf8(bytes) {
            Ok(text) => Ok(Zeroizing::new(text)),
            Err(e) => {
                drop(Zeroizing::new(e.into_bytes()));
                Err(StoreError::with_kind(
                    ErrorCategory::User,
                    ErrorKind::InvalidEncoding,
                    "decrypted secret is not valid UTF-8",
                ))
            }
        }
    }
}
