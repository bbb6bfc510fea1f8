//! Wire primitives (§4.1): varint and zig-zag codecs, fixed-width
//! little-endian codecs, tag encode/decode, and length-delimited framing.
//!
//! Everything in this module is a pure function over a [`bytes::Buf`] /
//! [`bytes::BufMut`] cursor. Field-kind dispatch (how an `Int32` differs
//! from a `SInt32` on the wire) lives one layer up, in
//! [`crate::codec::protobuf`], which is the only caller of these functions
//! outside of tests.

pub mod fixed;
pub mod length_delimiter;
pub mod varint;
pub mod wire_type;

pub use fixed::{read_fixed32, read_fixed64, write_fixed32, write_fixed64};
pub use length_delimiter::{decode_length_delimiter, encode_length_delimiter, length_delimiter_len};
pub use varint::{decode_varint, encode_varint, encoded_len_varint, zigzag_decode, zigzag_encode};
pub use wire_type::{check_wire_type, reject_group, WireType};

use bytes::{Buf, BufMut};

use crate::error::{parse_fail_kind, ParseFail};

/// Smallest legal field number (inclusive).
pub const MIN_FIELD_NUMBER: u32 = 1;
/// Largest legal field number (inclusive).
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;
/// Start of the reserved field-number range forbidden on decode (§6).
pub const RESERVED_FIELD_NUMBER_START: u32 = 19000;
/// End of the reserved field-number range forbidden on decode (§6), inclusive.
pub const RESERVED_FIELD_NUMBER_END: u32 = 19999;

/// Returns `true` for a field number that is structurally legal: within
/// `[MIN_FIELD_NUMBER, MAX_FIELD_NUMBER]` and outside the reserved range.
#[inline]
pub fn is_valid_field_number(number: u32) -> bool {
    (MIN_FIELD_NUMBER..=MAX_FIELD_NUMBER).contains(&number)
        && !(RESERVED_FIELD_NUMBER_START..=RESERVED_FIELD_NUMBER_END).contains(&number)
}

/// Tracks the bounds a parse call must respect: recursion depth and the
/// per-length-delimited-field size limit. Cheap to clone; a fresh
/// [`DecodeContext::enter`] is produced at each nested-message boundary.
#[derive(Clone, Copy, Debug)]
pub struct DecodeContext {
    depth_remaining: u32,
    max_size: u64,
}

impl DecodeContext {
    /// Creates a context for a top-level `parse` call.
    pub fn new(max_depth: u32, max_size: u64) -> Self {
        DecodeContext {
            depth_remaining: max_depth,
            max_size,
        }
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    /// Produces the context to use one level deeper, after checking that
    /// the current level still has depth budget. Built with the
    /// `no-recursion-limit` feature, the check is skipped entirely (the
    /// depth field is still threaded through for `with_max_size`).
    pub fn enter(&self) -> Result<DecodeContext, ParseFail> {
        #[cfg(not(feature = "no-recursion-limit"))]
        if self.depth_remaining == 0 {
            return Err(parse_fail_kind::DepthExceeded::new(self.depth_remaining).into());
        }
        Ok(DecodeContext {
            depth_remaining: self.depth_remaining.saturating_sub(1),
            max_size: self.max_size,
        })
    }

    /// Overrides the size limit for a single field carrying a `max_size`
    /// annotation, without disturbing the depth budget.
    pub fn with_max_size(&self, max_size: u64) -> DecodeContext {
        DecodeContext {
            depth_remaining: self.depth_remaining,
            max_size,
        }
    }

    /// Checks a declared length-delimited payload length against the
    /// current size limit.
    pub fn check_size(&self, declared: u64) -> Result<(), ParseFail> {
        if declared > self.max_size {
            return Err(parse_fail_kind::SizeExceeded::new(declared, self.max_size).into());
        }
        Ok(())
    }
}

/// Encodes a tag: a field number and wire type packed into one varint.
#[inline]
pub fn write_tag(number: u32, wire_type: WireType, buf: &mut impl BufMut) {
    debug_assert!(is_valid_field_number(number));
    let key = (number << 3) | wire_type as u32;
    encode_varint(u64::from(key), buf);
}

/// Decodes a tag into its field number and wire type.
///
/// Rejects field number 0, any number above `2^29 - 1`, and any number in
/// the reserved `19000..=19999` range.
#[inline]
pub fn read_tag(buf: &mut impl Buf) -> Result<(u32, WireType), ParseFail> {
    let key = decode_varint(buf)?;
    if key > u64::from(u32::MAX) {
        return Err(parse_fail_kind::Malformed::new(format!("invalid tag value: {key}")).into());
    }
    let wire_type = WireType::try_from(key & 0x07)?;
    let number = (key as u32) >> 3;

    if number == 0 {
        return Err(parse_fail_kind::Malformed::new("invalid field number: 0".into()).into());
    }
    if number > MAX_FIELD_NUMBER {
        return Err(
            parse_fail_kind::Malformed::new(format!("field number {number} out of range")).into(),
        );
    }
    if (RESERVED_FIELD_NUMBER_START..=RESERVED_FIELD_NUMBER_END).contains(&number) {
        return Err(parse_fail_kind::Malformed::new(format!(
            "field number {number} is in the reserved range"
        ))
        .into());
    }

    Ok((number, wire_type))
}

/// Returns the encoded width, in bytes, of a tag for `number`.
#[inline]
pub fn tag_len(number: u32) -> usize {
    encoded_len_varint(u64::from(number << 3))
}

/// Skips a field's payload given its wire type, honoring the depth/size
/// bounds of `ctx`. Groups (wire types 3/4) are always rejected: proto3
/// does not support them.
pub fn skip_field(wire_type: WireType, buf: &mut impl Buf, ctx: DecodeContext) -> Result<(), ParseFail> {
    reject_group(wire_type)?;
    let len = match wire_type {
        WireType::Varint => {
            decode_varint(buf)?;
            0
        }
        WireType::Fixed32 => 4,
        WireType::Fixed64 => 8,
        WireType::LengthDelimited => {
            let len = decode_varint(buf)?;
            ctx.check_size(len)?;
            len
        }
        WireType::StartGroup | WireType::EndGroup => unreachable!("rejected above"),
    };

    if len > buf.remaining() as u64 {
        return Err(parse_fail_kind::Malformed::new("buffer underflow".into()).into());
    }
    buf.advance(len as usize);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_round_trips() {
        let mut buf = Vec::new();
        write_tag(5, WireType::LengthDelimited, &mut buf);
        let (number, wire_type) = read_tag(&mut &buf[..]).unwrap();
        assert_eq!(number, 5);
        assert_eq!(wire_type, WireType::LengthDelimited);
        assert_eq!(tag_len(5), buf.len());
    }

    #[test]
    fn zero_field_number_is_malformed() {
        let mut buf = Vec::new();
        write_tag(0, WireType::Varint, &mut buf);
        // write_tag doesn't validate; verify read_tag rejects the bit pattern directly.
        let raw = vec![0x00];
        assert!(read_tag(&mut &raw[..]).is_err());
    }

    #[test]
    fn reserved_field_number_is_malformed() {
        let mut buf = Vec::new();
        write_tag(19500, WireType::Varint, &mut buf);
        assert!(read_tag(&mut &buf[..]).is_err());
    }

    #[test]
    fn group_wire_types_are_malformed() {
        let mut buf = Vec::new();
        write_tag(1, WireType::StartGroup, &mut buf);
        let (_, wire_type) = read_tag(&mut &buf[..]).unwrap();
        let ctx = DecodeContext::new(100, 1 << 20);
        assert!(skip_field(wire_type, &mut &b""[..], ctx).is_err());
    }

    #[test]
    fn depth_budget_is_enforced() {
        let ctx = DecodeContext::new(1, 1 << 20);
        let deeper = ctx.enter().unwrap();
        assert!(deeper.enter().is_err());
    }

    #[test]
    fn size_budget_is_enforced() {
        let ctx = DecodeContext::new(100, 16);
        assert!(ctx.check_size(16).is_ok());
        assert!(ctx.check_size(17).is_err());
    }
}
