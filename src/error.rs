use std::error::Error as StdError;
use std::io;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorCategory {
    /// Any failure that cannot be confidently attributed to any other error
    /// category in this enum.
    ///
    /// Use of Internal is never a guarantee that the error was not caused
    /// by the user; it only means the code cannot tell.
    Internal,

    /// The user provided invalid input (including a corrupt store file or a
    /// wrong master key) or asked for something impossible.
    User,
}

/// Fine-grained condition flags for consumers that want to branch on error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Input ended before a field of the declared size could be read.
    TruncatedInput,
    /// A byte run declared as text is not valid UTF-8.
    InvalidEncoding,
    /// A count or length does not fit the 16-bit field that has to hold it.
    FieldTooLong,
    /// Decryption failed authentication: wrong master key, or the stored
    /// value was tampered with.
    CipherMismatch,
    /// The armored text of a stored value is malformed.
    ArmoringInvalid,
    /// Base64 decoding of an armored value failed.
    ArmoringDecode,
    /// An armored value claims to be ours but uses an unsupported version.
    ArmoringFromFuture,
    /// The binary layout inside an armored value is invalid.
    SealedFormat,
    /// Extra bytes followed a sealed value.
    TrailingData,
    /// Low-level scrypt key derivation failed.
    ScryptFailure,
    /// NaCl secretbox (XSalsa20Poly1305) failed to seal data.
    SecretboxFailure,
    /// A master key or secret could not be obtained from its reader.
    SecretUnavailable,
    /// No entry with the requested name exists in the store.
    EntryNotFound,
    /// Interaction with the filesystem, stdin/stdout, or other I/O failed.
    Io,
}

#[derive(Debug, Error)]
#[error("{msg}")]
pub struct StoreError {
    /// Broad error category, always provided.
    pub category: ErrorCategory,
    /// Optional specific condition tag. Code consuming errors MUST handle
    /// the absence of a kind.
    pub kind: Option<ErrorKind>,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
    msg: String,
}

impl StoreError {
    /// Creates a new error that also tags the failure with a kind.
    pub fn with_kind(category: ErrorCategory, kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: None,
            msg: msg.into(),
        }
    }

    /// Creates a new error that carries both a kind tag and the originating source error.
    pub fn with_kind_and_source(
        category: ErrorCategory,
        kind: ErrorKind,
        msg: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            category,
            kind: Some(kind),
            source: Some(Box::new(source)),
            msg: msg.into(),
        }
    }

    /// Classifies an I/O failure on `what`. A missing file or a permission
    /// problem is the user's to fix; anything else is internal.
    pub fn io(what: impl Into<String>, err: io::Error) -> Self {
        let category = match err.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => ErrorCategory::User,
            _ => ErrorCategory::Internal,
        };
        Self::with_kind_and_source(category, ErrorKind::Io, what, err)
    }

    /// The user-facing message carried by the error.
    pub fn message(&self) -> &str {
        &self.msg
    }

    /// True if the error is tagged with `kind`.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == Some(kind)
    }

    /// Wraps the current error with a higher-level message while preserving the original as source.
    pub fn with_context(self, msg: impl Into<String>) -> Self {
        let category = self.category;
        let kind = self.kind;
        Self {
            category,
            kind,
            source: Some(Box::new(self)),
            msg: msg.into(),
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, StoreError>;
