//! Passphrase sealing using scrypt + XSalsa20Poly1305
//!
//! - scrypt derives a 32-byte key from the master key and a random salt
//! - NaCl secretbox (XSalsa20Poly1305) provides authenticated encryption
//!
//! The sealed binary format (little-endian) is:
//! - log2(N) scrypt cost: 1 byte
//! - salt: 16 bytes
//! - nonce: 24 bytes
//! - sealed box length: 4 bytes (u32)
//! - sealed box: variable length (includes 16-byte Poly1305 MAC)
//!
//! The cost travels with every sealed value, so values sealed under
//! different cost settings can live in the same store.

use crate::binio::{BinReader, BinWriter};
use crate::error::{ErrorCategory, ErrorKind, Result, StoreError};
use crypto_secretbox::aead::{Aead, KeyInit};
use crypto_secretbox::{Nonce, XSalsa20Poly1305};
use rand::RngCore;
use scrypt::{Params, scrypt};
use std::io::Cursor;
use zeroize::Zeroizing;

/// Length of salt in bytes
pub const SALT_LEN: usize = 16;

/// Length of nonce in bytes
pub const NONCE_LEN: usize = 24;

/// Length of derived key in bytes
const KEY_LEN: usize = 32;

/// scrypt r parameter (block size)
const SCRYPT_R: u32 = 8;

/// scrypt p parameter (parallelization)
const SCRYPT_P: u32 = 1;

/// Fixed-size part of a sealed value preceding the sealed box.
const HEADER_LEN: usize = 1 + SALT_LEN + NONCE_LEN + 4;

/// scrypt CPU/memory cost, expressed as log2(N).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScryptCost {
    log_n: u8,
}

impl ScryptCost {
    pub const MIN_LOG_N: u8 = 4;
    pub const MAX_LOG_N: u8 = 18;
    pub const DEFAULT_LOG_N: u8 = 15;

    pub fn new(log_n: u8) -> Result<Self> {
        if !(Self::MIN_LOG_N..=Self::MAX_LOG_N).contains(&log_n) {
            return Err(StoreError::with_kind(
                ErrorCategory::User,
                ErrorKind::ScryptFailure,
                format!(
                    "scrypt log2(N) must be between {} and {}, got {log_n}",
                    Self::MIN_LOG_N,
                    Self::MAX_LOG_N
                ),
            ));
        }
        Ok(Self { log_n })
    }

    pub fn log_n(self) -> u8 {
        self.log_n
    }
}

impl Default for ScryptCost {
    fn default() -> Self {
        Self {
            log_n: Self::DEFAULT_LOG_N,
        }
    }
}

/// Derive a 32-byte key from a passphrase and salt using scrypt
fn derive_key(
    passphrase: &[u8],
    salt: &[u8; SALT_LEN],
    cost: ScryptCost,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let params = Params::new(cost.log_n, SCRYPT_R, SCRYPT_P, KEY_LEN).map_err(|e| {
        StoreError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::ScryptFailure,
            format!("failed to create scrypt params: {e}"),
        )
    })?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    scrypt(passphrase, salt, &params, &mut key[..]).map_err(|e| {
        StoreError::with_kind(
            ErrorCategory::Internal,
            ErrorKind::ScryptFailure,
            format!("scrypt key derivation failed: {e}"),
        )
    })?;

    Ok(key)
}

/// Seal plaintext under a passphrase with random salt and nonce
pub fn seal(passphrase: &[u8], plaintext: &[u8], cost: ScryptCost) -> Result<Vec<u8>> {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);

    let mut nonce = [0u8; NONCE_LEN];
    rand::rng().fill_bytes(&mut nonce);

    seal_deterministic(passphrase, plaintext, cost, &salt, &nonce)
}

/// Seal plaintext under a passphrase using the provided salt and nonce
///
/// Only for producing reproducible output in tests. Reusing a salt/nonce pair
/// under the same passphrase breaks secretbox; use `seal()`.
pub fn seal_deterministic(
    passphrase: &[u8],
    plaintext: &[u8],
    cost: ScryptCost,
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
) -> Result<Vec<u8>> {
    let key = derive_key(passphrase, salt, cost)?;
    let cipher = XSalsa20Poly1305::new(&(*key).into());

    let sealed_box = cipher
        .encrypt(&Nonce::from(*nonce), plaintext)
        .map_err(|e| {
            StoreError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::SecretboxFailure,
                format!("encryption failed: {e}"),
            )
        })?;
    let sealed_box_len = u32::try_from(sealed_box.len()).map_err(|_| {
        StoreError::with_kind(
            ErrorCategory::User,
            ErrorKind::FieldTooLong,
            "plaintext too large to seal",
        )
    })?;

    let mut writer = BinWriter::in_memory();
    writer.write_u8(cost.log_n)?;
    writer.write_bytes(salt)?;
    writer.write_bytes(nonce)?;
    writer.write_u32(sealed_box_len)?;
    writer.write_bytes(&sealed_box)?;
    Ok(writer.into_bytes())
}

/// Open a sealed value with a passphrase
///
/// A wrong passphrase and a tampered-with value are indistinguishable; both
/// fail with `ErrorKind::CipherMismatch`.
pub fn open(passphrase: &[u8], sealed: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let mut reader = BinReader::from_slice(sealed);

    let log_n = reader
        .read_u8()
        .map_err(|e| e.with_context("sealed value truncated while reading scrypt cost"))?;
    let cost = ScryptCost::new(log_n).map_err(|_| {
        StoreError::with_kind(
            ErrorCategory::User,
            ErrorKind::SealedFormat,
            format!("sealed value has unsupported scrypt log2(N) {log_n}"),
        )
    })?;

    let salt: [u8; SALT_LEN] = read_array(&mut reader, "salt")?;
    let nonce: [u8; NONCE_LEN] = read_array(&mut reader, "nonce")?;

    let sealed_box_len = reader
        .read_u32()
        .map_err(|e| e.with_context("sealed value truncated while reading sealed box length"))?
        as usize;
    if sealed_box_len > sealed.len() - HEADER_LEN {
        return Err(StoreError::with_kind(
            ErrorCategory::User,
            ErrorKind::TruncatedInput,
            "truncated or corrupt input; claimed length greater than available input",
        ));
    }
    if sealed_box_len < sealed.len() - HEADER_LEN {
        return Err(StoreError::with_kind(
            ErrorCategory::User,
            ErrorKind::TrailingData,
            "invalid input: unexpected data after sealed box",
        ));
    }
    let sealed_box = &sealed[HEADER_LEN..];

    let key = derive_key(passphrase, &salt, cost)?;
    let cipher = XSalsa20Poly1305::new(&(*key).into());
    let plaintext = cipher
        .decrypt(&Nonce::from(nonce), sealed_box)
        .map_err(|_| {
            StoreError::with_kind(
                ErrorCategory::User,
                ErrorKind::CipherMismatch,
                "corrupt input, tampered-with data, or wrong master key",
            )
        })?;

    Ok(Zeroizing::new(plaintext))
}

fn read_array<const N: usize>(
    reader: &mut BinReader<Cursor<&[u8]>>,
    what: &str,
) -> Result<[u8; N]> {
    let bytes = reader
        .read_bytes(N)
        .map_err(|e| e.with_context(format!("sealed value truncated while reading {what}")))?;
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}
