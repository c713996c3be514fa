//! Text armoring for sealed values
//!
//! Sealed values are binary; store entries hold text. The armored form is
//! `saltypass1:` followed by unpadded base64url, which is:
//! - plain ASCII, so it survives the UTF-8 value field unchanged
//! - free of whitespace (including newlines)
//! - safe to paste into a shell or a URL

use crate::error::{ErrorCategory, ErrorKind, Result, StoreError};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

/// Prefix shared by every armor version.
const MAGIC_PREFIX: &str = "saltypass";

/// Version 1 marker.
const V1_MAGIC: &str = "saltypass1:";

/// Armor `body`, returning text suitable for an entry value.
pub fn wrap(body: &[u8]) -> String {
    let mut armored = String::with_capacity(V1_MAGIC.len() + body.len().div_ceil(3) * 4);
    armored.push_str(V1_MAGIC);
    URL_SAFE_NO_PAD.encode_string(body, &mut armored);
    armored
}

/// Strip the armor from `armored`, returning the original bytes.
pub fn unwrap(armored: &str) -> Result<Vec<u8>> {
    let Some(encoded) = armored.strip_prefix(V1_MAGIC) else {
        return Err(unrecognized(armored));
    };
    URL_SAFE_NO_PAD.decode(encoded).map_err(|e| {
        StoreError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::ArmoringDecode,
            format!("base64 decoding failed: {e}"),
            e,
        )
    })
}

fn unrecognized(armored: &str) -> StoreError {
    if armored.len() < V1_MAGIC.len() && V1_MAGIC.starts_with(armored) {
        StoreError::with_kind(
            ErrorCategory::User,
            ErrorKind::ArmoringInvalid,
            "value shorter than the armor marker; likely truncated",
        )
    } else if armored.starts_with(MAGIC_PREFIX) {
        StoreError::with_kind(
            ErrorCategory::User,
            ErrorKind::ArmoringFromFuture,
            "value claims to be saltypass armor, but not a version we support",
        )
    } else {
        StoreError::with_kind(
            ErrorCategory::User,
            ErrorKind::ArmoringInvalid,
            "value unrecognized as saltypass armor",
        )
    }
}
