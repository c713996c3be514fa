//! Store file framing
//!
//! A store file is a little-endian u16 entry count followed by that many
//! entries, each a u16-length-prefixed UTF-8 name and a u16-length-prefixed
//! UTF-8 value:
//!
//! ```text
//! u16 count
//! repeat count times:
//!     u16 name_len, name[name_len]
//!     u16 value_len, value[value_len]
//! ```
//!
//! There is no magic number, version, or end marker. Bytes after the last
//! declared entry are never read.

use crate::binio::{BinReader, BinWriter};
use crate::error::{ErrorCategory, ErrorKind, Result, StoreError};
use std::io::{Read, Seek, Write};

/// A named secret as it is persisted. `value` is opaque to this module; in
/// practice it is the armored ciphertext produced by a `Cipher`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub value: String,
}

impl Entry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Exact number of bytes `entries` encode to.
pub fn encoded_len(entries: &[Entry]) -> usize {
    2 + entries
        .iter()
        .map(|e| 2 + e.name.len() + 2 + e.value.len())
        .sum::<usize>()
}

/// Encode `entries` into a new buffer.
pub fn encode(entries: &[Entry]) -> Result<Vec<u8>> {
    let mut writer = BinWriter::in_memory();
    write_entries(&mut writer, entries)?;
    Ok(writer.into_bytes())
}

/// Decode a store from `bytes`.
pub fn decode(bytes: &[u8]) -> Result<Vec<Entry>> {
    read_entries(&mut BinReader::from_slice(bytes))
}

/// Write `entries` at the writer's current position.
///
/// Every count and length is checked before the first byte is written, so a
/// failure never leaves a partial entry behind.
pub fn write_entries<W: Write + Seek>(writer: &mut BinWriter<W>, entries: &[Entry]) -> Result<()> {
    let count = u16::try_from(entries.len()).map_err(|_| {
        StoreError::with_kind(
            ErrorCategory::User,
            ErrorKind::FieldTooLong,
            format!(
                "{} entries exceed the store maximum of {}",
                entries.len(),
                u16::MAX
            ),
        )
    })?;
    for (i, entry) in entries.iter().enumerate() {
        check_field_len(i, "name", &entry.name)?;
        check_field_len(i, "value", &entry.value)?;
    }

    writer.write_u16(count)?;
    for entry in entries {
        writer.write_u16(entry.name.len() as u16)?;
        writer.write_text(&entry.name)?;
        writer.write_u16(entry.value.len() as u16)?;
        writer.write_text(&entry.value)?;
    }
    Ok(())
}

/// Read a complete store from the reader's current position.
pub fn read_entries<R: Read + Seek>(reader: &mut BinReader<R>) -> Result<Vec<Entry>> {
    let count = reader
        .read_u16()
        .map_err(|e| e.with_context("failed to read entry count"))?;

    let mut entries = Vec::with_capacity(count as usize);
    for i in 0..count as usize {
        let name = read_field(reader, i, "name")?;
        let value = read_field(reader, i, "value")?;
        entries.push(Entry { name, value });
    }
    Ok(entries)
}

fn check_field_len(index: usize, field: &str, text: &str) -> Result<()> {
    if text.len() <= u16::MAX as usize {
        return Ok(());
    }
    Err(StoreError::with_kind(
        ErrorCategory::User,
        ErrorKind::FieldTooLong,
        format!(
            "entry {index}: {field} is {} bytes, maximum is {}",
            text.len(),
            u16::MAX
        ),
    ))
}

fn read_field<R: Read + Seek>(
    reader: &mut BinReader<R>,
    index: usize,
    field: &str,
) -> Result<String> {
    let len = reader
        .read_u16()
        .map_err(|e| e.with_context(format!("entry {index}: failed to read {field} length")))?;
    reader
        .read_text(len as usize)
        .map_err(|e| e.with_context(format!("entry {index}: failed to read {field}")))
}
