//! Saltypass - a small encrypted password store
//!
//! Named secrets live in a single file with a fixed little-endian layout
//! (see [`record`]). Each value is sealed with scrypt + NaCl secretbox and
//! armored to text before it is stored (see [`cipher`]).

#![forbid(unsafe_code)]

pub mod armor;
pub mod binio;
pub mod cipher;
pub mod config;
pub mod error;
pub mod prompt;
pub mod record;
pub mod secretcrypt;
pub mod store;

pub use cipher::{Cipher, SecretboxCipher};
pub use error::{ErrorCategory, ErrorKind, Result, StoreError};
pub use record::Entry;
pub use store::SecretStore;
