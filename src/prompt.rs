//! Reading master keys and secrets

use crate::error::{ErrorCategory, ErrorKind, Result, StoreError};
use std::io::{self, IsTerminal, Read, Write};
use zeroize::Zeroizing;

/// Trait for reading sensitive text (master keys, secrets) from various sources
pub trait SecretReader {
    /// Returns the text wrapped in `Zeroizing` so it is wiped from memory
    /// when dropped.
    fn read_secret(&mut self) -> Result<Zeroizing<String>>;
}

/// Reads everything from an `io::Read` source such as stdin or a file
///
/// A single trailing `\n` or `\r\n` is dropped, so `echo key | saltypass ...`
/// and files saved by ordinary editors yield the key that was meant.
pub struct StreamSecretReader {
    reader: Box<dyn Read>,
}

impl StreamSecretReader {
    pub fn new(reader: Box<dyn Read>) -> Self {
        Self { reader }
    }
}

impl SecretReader for StreamSecretReader {
    fn read_secret(&mut self) -> Result<Zeroizing<String>> {
        let mut data = Zeroizing::new(Vec::new());
        self.reader.read_to_end(&mut data).map_err(|e| {
            StoreError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::SecretUnavailable,
                format!("error reading secret: {e}"),
                e,
            )
        })?;

        if data.ends_with(b"\n") {
            data.pop();
            if data.ends_with(b"\r") {
                data.pop();
            }
        }

        let text = std::str::from_utf8(&data).map_err(|e| {
            StoreError::with_kind_and_source(
                ErrorCategory::User,
                ErrorKind::InvalidEncoding,
                "secret input is not valid UTF-8",
                e,
            )
        })?;
        Ok(Zeroizing::new(text.to_owned()))
    }
}

/// Reads from the terminal with no echo
pub struct TerminalSecretReader {
    prompt: String,
}

impl TerminalSecretReader {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
        }
    }

    pub fn master_key() -> Self {
        Self::new("Master key (saltypass): ")
    }
}

impl SecretReader for TerminalSecretReader {
    fn read_secret(&mut self) -> Result<Zeroizing<String>> {
        if !io::stdin().is_terminal() {
            return Err(StoreError::with_kind(
                ErrorCategory::User,
                ErrorKind::SecretUnavailable,
                "cannot read from terminal - stdin is not a terminal",
            ));
        }

        let mut stderr = io::stderr();
        stderr
            .write_all(self.prompt.as_bytes())
            .and_then(|()| stderr.flush())
            .map_err(|e| {
                StoreError::with_kind_and_source(
                    ErrorCategory::Internal,
                    ErrorKind::Io,
                    format!("failed to write prompt: {e}"),
                    e,
                )
            })?;

        // rpassword hands back a plain String; wrap it straight away.
        let secret = rpassword::read_password().map_err(|e| {
            StoreError::with_kind_and_source(
                ErrorCategory::Internal,
                ErrorKind::SecretUnavailable,
                format!("failure reading from terminal: {e}"),
                e,
            )
        })?;

        Ok(Zeroizing::new(secret))
    }
}
