//! Buffer abstractions (§4.2): a read/write contract implemented by three
//! concrete cursors — [`slice::SliceCursor`] (zero-copy, read-only),
//! [`buffered::BufferedData`] (positioned, read-write, in-memory), and
//! [`stream::StreamReader`]/[`stream::StreamWriter`] (blocking, over an OS
//! stream). Every codec in [`crate::codec`] is written once against
//! [`ReadCursor`]/[`WriteCursor`] and works unmodified over all three.

pub mod buffered;
pub mod slice;
pub mod stream;

use std::borrow::Cow;

use crate::encoding::{self, WireType};
use crate::error::{parse_fail_kind, EncodeFail, ParseFail};

/// A cursor that can be read from sequentially.
///
/// `read_bytes` may return a zero-copy view into the cursor's own backing
/// storage ([`Cow::Borrowed`]) or a freshly allocated copy
/// ([`Cow::Owned`]) — callers (in particular, the message codecs) must not
/// assume which, and must copy the bytes out before returning them as part
/// of a parsed model (see the "parsers never wrap" invariant in §4.2).
pub trait ReadCursor {
    /// Current read position, in bytes from the start of the cursor.
    fn position(&self) -> u64;

    /// Bytes left to read, or `u64::MAX` if unbounded (a live stream).
    fn remaining(&self) -> u64;

    /// Reads a single byte.
    fn read_byte(&mut self) -> Result<u8, ParseFail>;

    /// Reads exactly `len` bytes.
    fn read_bytes(&mut self, len: usize) -> Result<Cow<'_, [u8]>, ParseFail>;

    /// Advances the cursor by `n` bytes without materializing them.
    fn skip(&mut self, n: u64) -> Result<(), ParseFail> {
        let mut remaining = n;
        // Default: drain through read_bytes in chunks. Concrete cursors
        // override this with a plain position bump where possible.
        while remaining > 0 {
            let chunk = remaining.min(4096) as usize;
            self.read_bytes(chunk)?;
            remaining -= chunk as u64;
        }
        Ok(())
    }

    /// Decodes a LEB128 varint. The default walks byte-by-byte and is
    /// correct for every cursor kind, including streams; in-memory cursors
    /// override it with the vectorized implementation in
    /// [`encoding::varint`].
    fn read_varint(&mut self) -> Result<u64, ParseFail> {
        let mut value = 0u64;
        for count in 0..10 {
            let byte = self.read_byte()?;
            value |= u64::from(byte & 0x7F) << (count * 7);
            if byte < 0x80 {
                if count == 9 && byte >= 0x02 {
                    return Err(parse_fail_kind::Malformed::new("invalid varint".into()).into());
                }
                return Ok(value);
            }
        }
        Err(parse_fail_kind::Malformed::new("invalid varint".into()).into())
    }

    /// Reads a little-endian `u32` (wire type `Fixed32`).
    fn read_fixed32(&mut self) -> Result<u32, ParseFail> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes(bytes.as_ref().try_into().unwrap()))
    }

    /// Reads a little-endian `u64` (wire type `Fixed64`).
    fn read_fixed64(&mut self) -> Result<u64, ParseFail> {
        let bytes = self.read_bytes(8)?;
        Ok(u64::from_le_bytes(bytes.as_ref().try_into().unwrap()))
    }

    /// Reads a tag (field number + wire type).
    fn read_tag(&mut self) -> Result<(u32, WireType), ParseFail> {
        let key = self.read_varint()?;
        if key > u64::from(u32::MAX) {
            return Err(parse_fail_kind::Malformed::new(format!("invalid tag value: {key}")).into());
        }
        let wire_type = WireType::try_from(key & 0x07)?;
        let number = (key as u32) >> 3;
        if number == 0 || number > encoding::MAX_FIELD_NUMBER {
            return Err(parse_fail_kind::Malformed::new(format!(
                "invalid field number: {number}"
            ))
            .into());
        }
        if (encoding::RESERVED_FIELD_NUMBER_START..=encoding::RESERVED_FIELD_NUMBER_END)
            .contains(&number)
        {
            return Err(parse_fail_kind::Malformed::new(format!(
                "field number {number} is reserved"
            ))
            .into());
        }
        Ok((number, wire_type))
    }
}

/// A cursor that can be written to sequentially.
pub trait WriteCursor {
    /// Remaining writable capacity, or `u64::MAX` if unbounded (a growable
    /// buffer or a live stream).
    fn remaining_mut(&self) -> u64;

    fn write_byte(&mut self, byte: u8) -> Result<(), EncodeFail>;

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeFail>;

    fn write_varint(&mut self, mut value: u64) -> Result<(), EncodeFail> {
        let mut tmp = [0u8; 10];
        let mut i = 0;
        loop {
            if value < 0x80 {
                tmp[i] = value as u8;
                i += 1;
                break;
            } else {
                tmp[i] = ((value & 0x7F) | 0x80) as u8;
                value >>= 7;
                i += 1;
            }
        }
        self.write_bytes(&tmp[..i])
    }

    fn write_fixed32(&mut self, value: u32) -> Result<(), EncodeFail> {
        self.write_bytes(&value.to_le_bytes())
    }

    fn write_fixed64(&mut self, value: u64) -> Result<(), EncodeFail> {
        self.write_bytes(&value.to_le_bytes())
    }

    fn write_tag(&mut self, number: u32, wire_type: WireType) -> Result<(), EncodeFail> {
        let key = (number << 3) | wire_type as u32;
        self.write_varint(u64::from(key))
    }
}

pub use buffered::BufferedData;
pub use slice::SliceCursor;
pub use stream::{StreamReader, StreamWriter};
