//! Blocking adapters over an OS sequential stream.
//!
//! Unlike [`super::slice::SliceCursor`] and [`super::buffered::BufferedData`],
//! a stream has no addressable backing storage to borrow from, so every
//! [`ReadCursor::read_bytes`] call here allocates. `position` is simply the
//! count of bytes read (or written) so far; there is no `limit` and no
//! seeking.

use std::borrow::Cow;
use std::io::{Read, Write};

use crate::error::{EncodeFail, ParseFail};

use super::{ReadCursor, WriteCursor};

/// Wraps a blocking [`std::io::Read`] stream.
pub struct StreamReader<R> {
    inner: R,
    position: u64,
}

impl<R: Read> StreamReader<R> {
    pub fn new(inner: R) -> Self {
        StreamReader { inner, position: 0 }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ReadCursor for StreamReader<R> {
    fn position(&self) -> u64 {
        self.position
    }

    /// Unknown ahead of time for a live stream.
    fn remaining(&self) -> u64 {
        u64::MAX
    }

    fn read_byte(&mut self) -> Result<u8, ParseFail> {
        let mut byte = [0u8; 1];
        self.inner.read_exact(&mut byte)?;
        self.position += 1;
        Ok(byte[0])
    }

    fn read_bytes(&mut self, len: usize) -> Result<Cow<'_, [u8]>, ParseFail> {
        let mut buf = vec![0u8; len];
        self.inner.read_exact(&mut buf)?;
        self.position += len as u64;
        Ok(Cow::Owned(buf))
    }

    fn skip(&mut self, n: u64) -> Result<(), ParseFail> {
        let mut remaining = n;
        let mut sink = [0u8; 4096];
        while remaining > 0 {
            let chunk = remaining.min(sink.len() as u64) as usize;
            self.inner.read_exact(&mut sink[..chunk])?;
            remaining -= chunk as u64;
        }
        self.position += n;
        Ok(())
    }
}

/// Wraps a blocking [`std::io::Write`] stream.
pub struct StreamWriter<W> {
    inner: W,
    position: u64,
}

impl<W: Write> StreamWriter<W> {
    pub fn new(inner: W) -> Self {
        StreamWriter { inner, position: 0 }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn flush(&mut self) -> Result<(), EncodeFail> {
        self.inner.flush()?;
        Ok(())
    }
}

impl<W: Write> WriteCursor for StreamWriter<W> {
    /// A stream has no fixed capacity.
    fn remaining_mut(&self) -> u64 {
        u64::MAX
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), EncodeFail> {
        self.inner.write_all(&[byte])?;
        self.position += 1;
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeFail> {
        self.inner.write_all(bytes)?;
        self.position += bytes.len() as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_drive_position_forward() {
        let data = vec![1u8, 2, 3, 4, 5];
        let mut reader = StreamReader::new(&data[..]);
        assert_eq!(reader.read_byte().unwrap(), 1);
        assert_eq!(reader.read_bytes(2).unwrap().as_ref(), &[2, 3]);
        assert_eq!(reader.position(), 3);
        reader.skip(2).unwrap();
        assert_eq!(reader.position(), 5);
        assert!(reader.read_byte().is_err());
    }

    #[test]
    fn writes_round_trip_through_a_vec() {
        let mut out = Vec::new();
        {
            let mut writer = StreamWriter::new(&mut out);
            writer.write_varint(300).unwrap();
            writer.write_bytes(&[9, 9]).unwrap();
        }
        let mut reader = StreamReader::new(&out[..]);
        assert_eq!(reader.read_varint().unwrap(), 300);
        assert_eq!(reader.read_bytes(2).unwrap().as_ref(), &[9, 9]);
    }
}
