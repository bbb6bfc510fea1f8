//! A positioned, growable in-memory buffer usable for both reading and
//! writing, in the style of `java.nio.ByteBuffer`.

use std::borrow::Cow;

use crate::encoding::varint::decode_varint;
use crate::encoding::{read_fixed32, read_fixed64};
use crate::error::{parse_fail_kind, EncodeFail, ParseFail};

use super::{ReadCursor, WriteCursor};

/// Owns (or, via [`BufferedData::from_vec`], takes ownership of) a heap
/// region and tracks a single `position`/`limit` pair shared between
/// reading and writing.
///
/// While writing, `position` is the next byte to append and `limit` is
/// `data.len()`. Calling [`BufferedData::flip`] switches the buffer into
/// read mode: `limit` becomes the old `position` (the end of what was
/// written) and `position` resets to zero, so the bytes just written can be
/// read back without a copy.
#[derive(Clone, Debug, Default)]
pub struct BufferedData {
    data: Vec<u8>,
    position: usize,
    limit: usize,
}

impl BufferedData {
    pub fn new() -> Self {
        BufferedData::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        BufferedData {
            data: Vec::with_capacity(capacity),
            position: 0,
            limit: 0,
        }
    }

    /// Wraps an existing buffer in write mode, appending after its current
    /// contents.
    pub fn from_vec(data: Vec<u8>) -> Self {
        let limit = data.len();
        BufferedData {
            data,
            position: limit,
            limit,
        }
    }

    /// Switches from write mode to read mode: the bytes written so far
    /// become readable from the start, and no further writes are possible
    /// until [`BufferedData::clear`] is called.
    pub fn flip(&mut self) -> &mut Self {
        self.limit = self.position;
        self.position = 0;
        self
    }

    /// Resets to an empty buffer in write mode, retaining capacity.
    pub fn clear(&mut self) {
        self.data.clear();
        self.position = 0;
        self.limit = 0;
    }

    /// Consumes the buffer, returning the underlying storage.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..]
    }
}

impl ReadCursor for BufferedData {
    fn position(&self) -> u64 {
        self.position as u64
    }

    fn remaining(&self) -> u64 {
        (self.limit - self.position) as u64
    }

    fn read_byte(&mut self) -> Result<u8, ParseFail> {
        if self.position >= self.limit {
            return Err(parse_fail_kind::Malformed::new("buffer underflow".into()).into());
        }
        let byte = self.data[self.position];
        self.position += 1;
        Ok(byte)
    }

    fn read_bytes(&mut self, len: usize) -> Result<Cow<'_, [u8]>, ParseFail> {
        if self.limit - self.position < len {
            return Err(parse_fail_kind::Malformed::new("buffer underflow".into()).into());
        }
        let start = self.position;
        self.position += len;
        Ok(Cow::Borrowed(&self.data[start..start + len]))
    }

    fn skip(&mut self, n: u64) -> Result<(), ParseFail> {
        let n = n as usize;
        if self.limit - self.position < n {
            return Err(parse_fail_kind::Malformed::new("buffer underflow".into()).into());
        }
        self.position += n;
        Ok(())
    }

    fn read_varint(&mut self) -> Result<u64, ParseFail> {
        let mut chunk = &self.data[self.position..self.limit];
        let before = chunk.len();
        let value = decode_varint(&mut chunk)?;
        self.position += before - chunk.len();
        Ok(value)
    }

    fn read_fixed32(&mut self) -> Result<u32, ParseFail> {
        let mut chunk = &self.data[self.position..self.limit];
        let value = read_fixed32(&mut chunk)?;
        self.position += 4;
        Ok(value)
    }

    fn read_fixed64(&mut self) -> Result<u64, ParseFail> {
        let mut chunk = &self.data[self.position..self.limit];
        let value = read_fixed64(&mut chunk)?;
        self.position += 8;
        Ok(value)
    }
}

impl WriteCursor for BufferedData {
    fn remaining_mut(&self) -> u64 {
        u64::MAX - self.data.len() as u64
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), EncodeFail> {
        self.data.push(byte);
        self.position += 1;
        self.limit = self.data.len();
        Ok(())
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeFail> {
        self.data.extend_from_slice(bytes);
        self.position += bytes.len();
        self.limit = self.data.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_flip_then_read() {
        let mut buf = BufferedData::new();
        buf.write_varint(300).unwrap();
        buf.write_bytes(&[1, 2, 3]).unwrap();
        buf.flip();
        assert_eq!(buf.read_varint().unwrap(), 300);
        assert_eq!(buf.read_bytes(3).unwrap().as_ref(), &[1, 2, 3]);
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn clear_resets_to_write_mode() {
        let mut buf = BufferedData::new();
        buf.write_byte(7).unwrap();
        buf.flip();
        buf.clear();
        assert_eq!(buf.remaining(), 0);
        buf.write_byte(9).unwrap();
        buf.flip();
        assert_eq!(buf.read_byte().unwrap(), 9);
    }
}
