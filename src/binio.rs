//! Typed binary reading and writing over any seekable byte medium
//!
//! `BinReader` and `BinWriter` wrap anything implementing `Read + Seek` or
//! `Write + Seek`: an in-memory `Cursor` or an open `File` alike. Every
//! multi-byte integer uses the byte order chosen at construction, which
//! defaults to little-endian.
//!
//! Running out of input is always reported as `ErrorKind::TruncatedInput`;
//! text that is not UTF-8 as `ErrorKind::InvalidEncoding`.

use crate::error::{ErrorCategory, ErrorKind, Result, StoreError};
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::mem::size_of;

/// Byte order of multi-byte integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

macro_rules! read_int {
    ($name:ident, $ty:ty) => {
        #[doc = concat!("Read a `", stringify!($ty), "` in the configured byte order.")]
        pub fn $name(&mut self) -> Result<$ty> {
            let mut buf = [0u8; size_of::<$ty>()];
            self.fill(&mut buf, stringify!($ty))?;
            Ok(match self.endian {
                Endian::Little => <$ty>::from_le_bytes(buf),
                Endian::Big => <$ty>::from_be_bytes(buf),
            })
        }
    };
}

macro_rules! write_int {
    ($name:ident, $ty:ty) => {
        #[doc = concat!("Write a `", stringify!($ty), "` in the configured byte order.")]
        pub fn $name(&mut self, value: $ty) -> Result<()> {
            let buf = match self.endian {
                Endian::Little => value.to_le_bytes(),
                Endian::Big => value.to_be_bytes(),
            };
            self.write_bytes(&buf)
        }
    };
}

pub struct BinReader<R> {
    inner: R,
    endian: Endian,
}

impl<R: Read + Seek> BinReader<R> {
    /// Little-endian reader over `inner`.
    pub fn new(inner: R) -> Self {
        Self::with_endian(inner, Endian::Little)
    }

    pub fn with_endian(inner: R, endian: Endian) -> Self {
        Self { inner, endian }
    }

    read_int!(read_u8, u8);
    read_int!(read_u16, u16);
    read_int!(read_u32, u32);
    read_int!(read_u64, u64);
    read_int!(read_i8, i8);
    read_int!(read_i16, i16);
    read_int!(read_i32, i32);
    read_int!(read_i64, i64);

    /// Read exactly `n` raw bytes.
    ///
    /// Only as much memory as the medium actually supplies is allocated, so a
    /// bogus length read from corrupt input cannot cause a huge allocation.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        (&mut self.inner)
            .take(n as u64)
            .read_to_end(&mut buf)
            .map_err(|e| StoreError::io("failed to read from input", e))?;
        if buf.len() < n {
            return Err(truncated(&format!("{n} bytes")));
        }
        Ok(buf)
    }

    /// Read exactly `n` bytes and decode them as UTF-8.
    pub fn read_text(&mut self, n: usize) -> Result<String> {
        let bytes = self.read_bytes(n)?;
        decode_utf8(bytes)
    }

    /// Read exactly `n` bytes, XOR each with `key`, and decode as UTF-8.
    pub fn read_text_xor(&mut self, n: usize, key: u8) -> Result<String> {
        let mut bytes = self.read_bytes(n)?;
        bytes.iter_mut().for_each(|b| *b ^= key);
        decode_utf8(bytes)
    }

    /// Read text up to (not including) `terminator`, leaving the position
    /// just past the terminator.
    pub fn read_null_terminated_text(&mut self, terminator: u8) -> Result<String> {
        let mut bytes = Vec::new();
        loop {
            let mut b = [0u8; 1];
            self.fill(&mut b, "terminated text")?;
            if b[0] == terminator {
                break;
            }
            bytes.push(b[0]);
        }
        decode_utf8(bytes)
    }

    /// Move to absolute position `offset`.
    pub fn seek(&mut self, offset: u64) -> Result<u64> {
        self.inner
            .seek(SeekFrom::Start(offset))
            .map_err(|e| StoreError::io("failed to seek in input", e))
    }

    /// Current absolute position.
    pub fn tell(&mut self) -> Result<u64> {
        self.inner
            .stream_position()
            .map_err(|e| StoreError::io("failed to query input position", e))
    }

    /// Advance `n` bytes without reading them.
    pub fn skip(&mut self, n: u64) -> Result<u64> {
        let delta = i64::try_from(n).map_err(|_| {
            StoreError::with_kind(
                ErrorCategory::Internal,
                ErrorKind::Io,
                format!("cannot skip {n} bytes"),
            )
        })?;
        self.inner
            .seek(SeekFrom::Current(delta))
            .map_err(|e| StoreError::io("failed to skip in input", e))
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn fill(&mut self, buf: &mut [u8], what: &str) -> Result<()> {
        self.inner.read_exact(buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                truncated(what)
            } else {
                StoreError::io(format!("failed to read {what}"), e)
            }
        })
    }
}

impl<'a> BinReader<Cursor<&'a [u8]>> {
    /// Little-endian reader over an in-memory buffer.
    pub fn from_slice(bytes: &'a [u8]) -> Self {
        Self::new(Cursor::new(bytes))
    }
}

pub struct BinWriter<W> {
    inner: W,
    endian: Endian,
}

impl<W: Write + Seek> BinWriter<W> {
    /// Little-endian writer over `inner`.
    pub fn new(inner: W) -> Self {
        Self::with_endian(inner, Endian::Little)
    }

    pub fn with_endian(inner: W, endian: Endian) -> Self {
        Self { inner, endian }
    }

    write_int!(write_u8, u8);
    write_int!(write_u16, u16);
    write_int!(write_u32, u32);
    write_int!(write_u64, u64);
    write_int!(write_i8, i8);
    write_int!(write_i16, i16);
    write_int!(write_i32, i32);
    write_int!(write_i64, i64);

    pub fn write_bytes(&mut self, buf: &[u8]) -> Result<()> {
        self.inner
            .write_all(buf)
            .map_err(|e| StoreError::io("failed to write output", e))
    }

    /// Write the UTF-8 bytes of `text` with no length prefix.
    pub fn write_text(&mut self, text: &str) -> Result<()> {
        self.write_bytes(text.as_bytes())
    }

    /// Write the UTF-8 bytes of `text` followed by a single zero byte.
    pub fn write_null_terminated_text(&mut self, text: &str) -> Result<()> {
        self.write_text(text)?;
        self.write_u8(0)
    }

    /// Emit `n` zero bytes.
    pub fn skip(&mut self, n: u64) -> Result<()> {
        io::copy(&mut io::repeat(0).take(n), &mut self.inner)
            .map_err(|e| StoreError::io("failed to write padding", e))?;
        Ok(())
    }

    /// Move to absolute position `offset`.
    pub fn seek(&mut self, offset: u64) -> Result<u64> {
        self.inner
            .seek(SeekFrom::Start(offset))
            .map_err(|e| StoreError::io("failed to seek in output", e))
    }

    /// Current absolute position.
    pub fn tell(&mut self) -> Result<u64> {
        self.inner
            .stream_position()
            .map_err(|e| StoreError::io("failed to query output position", e))
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner
            .flush()
            .map_err(|e| StoreError::io("failed to flush output", e))
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl BinWriter<Cursor<Vec<u8>>> {
    /// Little-endian writer into a growable in-memory buffer.
    pub fn in_memory() -> Self {
        Self::new(Cursor::new(Vec::new()))
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.inner.into_inner()
    }
}

fn truncated(what: &str) -> StoreError {
    StoreError::with_kind(
        ErrorCategory::User,
        ErrorKind::TruncatedInput,
        format!("input truncated while reading {what}"),
    )
}

fn decode_utf8(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| {
        StoreError::with_kind_and_source(
            ErrorCategory::User,
            ErrorKind::InvalidEncoding,
            "text is not valid UTF-8",
            e,
        )
    })
}
