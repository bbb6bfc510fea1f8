//! Per-`FieldKind` binary encode/decode helpers (§4.1, §4.3).
//!
//! Generated `write`/`parse` functions call into one of these modules per
//! field, the same way `prost`'s derive output calls into
//! `prost::encoding::{int32, string, message, ...}`. Each module exposes
//! `encode`, `merge`, `encoded_len`, plus `encode_repeated` /
//! `merge_repeated` / `encoded_len_repeated` and, for packable kinds,
//! `encode_packed` / `encoded_len_packed`. Whether to call `encode` at all
//! (default omission) is the caller's decision, not this module's.

use crate::buffer::{ReadCursor, WriteCursor};
use crate::encoding::{self, DecodeContext, WireType};
use crate::error::{parse_fail_kind, EncodeFail, ParseFail};

/// Reads a length-delimited payload's declared length, checks it against
/// `ctx`, and returns the sub-context nested content should be parsed with.
fn read_len_prefix<R: ReadCursor>(
    input: &mut R,
    ctx: DecodeContext,
) -> Result<(u64, DecodeContext), ParseFail> {
    let len = input.read_varint()?;
    ctx.check_size(len)?;
    Ok((len, ctx))
}

macro_rules! varint_field {
    (
        $proto_ty:ident,
        $ty:ty,
        to_u64($to_v:ident) $to:expr,
        from_u64($from_v:ident) $from:expr
    ) => {
        pub mod $proto_ty {
            use super::*;

            pub fn encode<W: WriteCursor>(tag: u32, $to_v: &$ty, out: &mut W) -> Result<(), EncodeFail> {
                out.write_tag(tag, WireType::Varint)?;
                out.write_varint($to)
            }

            pub fn merge<R: ReadCursor>(
                wire_type: WireType,
                value: &mut $ty,
                input: &mut R,
                _ctx: DecodeContext,
            ) -> Result<(), ParseFail> {
                encoding::check_wire_type(WireType::Varint, wire_type, 0)?;
                let $from_v = input.read_varint()?;
                *value = $from;
                Ok(())
            }

            pub fn encode_repeated<W: WriteCursor>(
                tag: u32,
                values: &[$ty],
                out: &mut W,
            ) -> Result<(), EncodeFail> {
                for value in values {
                    encode(tag, value, out)?;
                }
                Ok(())
            }

            pub fn encode_packed<W: WriteCursor>(
                tag: u32,
                values: &[$ty],
                out: &mut W,
            ) -> Result<(), EncodeFail> {
                if values.is_empty() {
                    return Ok(());
                }
                out.write_tag(tag, WireType::LengthDelimited)?;
                let len: usize = values
                    .iter()
                    .map(|$to_v| encoding::encoded_len_varint($to))
                    .sum();
                out.write_varint(len as u64)?;
                for $to_v in values {
                    out.write_varint($to)?;
                }
                Ok(())
            }

            pub fn merge_repeated<R: ReadCursor>(
                wire_type: WireType,
                values: &mut Vec<$ty>,
                input: &mut R,
                ctx: DecodeContext,
            ) -> Result<(), ParseFail> {
                if wire_type == WireType::LengthDelimited {
                    let (len, ctx) = read_len_prefix(input, ctx)?;
                    let limit = input.position() + len;
                    while input.position() < limit {
                        let mut value: $ty = Default::default();
                        merge(WireType::Varint, &mut value, input, ctx)?;
                        values.push(value);
                    }
                    if input.position() != limit {
                        return Err(
                            parse_fail_kind::Malformed::new("delimited length exceeded".into())
                                .into(),
                        );
                    }
                } else {
                    encoding::check_wire_type(WireType::Varint, wire_type, 0)?;
                    let mut value: $ty = Default::default();
                    merge(wire_type, &mut value, input, ctx)?;
                    values.push(value);
                }
                Ok(())
            }

            pub fn encoded_len(tag: u32, $to_v: &$ty) -> u64 {
                encoding::tag_len(tag) as u64 + encoding::encoded_len_varint($to) as u64
            }

            pub fn encoded_len_repeated(tag: u32, values: &[$ty]) -> u64 {
                values.iter().map(|v| encoded_len(tag, v)).sum()
            }

            pub fn encoded_len_packed(tag: u32, values: &[$ty]) -> u64 {
                if values.is_empty() {
                    return 0;
                }
                let len: u64 = values
                    .iter()
                    .map(|$to_v| encoding::encoded_len_varint($to) as u64)
                    .sum();
                encoding::tag_len(tag) as u64 + encoding::encoded_len_varint(len) as u64 + len
            }
        }
    };
}

varint_field!(bool_field, bool, to_u64(value) u64::from(*value), from_u64(value) value != 0);
varint_field!(int32, i32, to_u64(value) *value as u64, from_u64(value) value as i32);
varint_field!(int64, i64, to_u64(value) *value as u64, from_u64(value) value as i64);
varint_field!(uint32, u32, to_u64(value) u64::from(*value), from_u64(value) value as u32);
varint_field!(uint64, u64, to_u64(value) *value, from_u64(value) value);
varint_field!(
    sint32,
    i32,
    to_u64(value) encoding::zigzag_encode(i64::from(*value)) as u32 as u64,
    from_u64(value) encoding::zigzag_decode(value) as i32
);
varint_field!(
    sint64,
    i64,
    to_u64(value) encoding::zigzag_encode(*value),
    from_u64(value) encoding::zigzag_decode(value)
);

macro_rules! fixed_field {
    ($proto_ty:ident, $ty:ty, $width:literal, $wire_type:expr, $write:ident, $read:ident) => {
        pub mod $proto_ty {
            use super::*;

            pub fn encode<W: WriteCursor>(tag: u32, value: &$ty, out: &mut W) -> Result<(), EncodeFail> {
                out.write_tag(tag, $wire_type)?;
                out.$write(*value)
            }

            pub fn merge<R: ReadCursor>(
                wire_type: WireType,
                value: &mut $ty,
                input: &mut R,
                _ctx: DecodeContext,
            ) -> Result<(), ParseFail> {
                encoding::check_wire_type($wire_type, wire_type, 0)?;
                *value = input.$read()?;
                Ok(())
            }

            pub fn encode_repeated<W: WriteCursor>(
                tag: u32,
                values: &[$ty],
                out: &mut W,
            ) -> Result<(), EncodeFail> {
                for value in values {
                    encode(tag, value, out)?;
                }
                Ok(())
            }

            pub fn encode_packed<W: WriteCursor>(
                tag: u32,
                values: &[$ty],
                out: &mut W,
            ) -> Result<(), EncodeFail> {
                if values.is_empty() {
                    return Ok(());
                }
                out.write_tag(tag, WireType::LengthDelimited)?;
                out.write_varint(values.len() as u64 * $width)?;
                for value in values {
                    out.$write(*value)?;
                }
                Ok(())
            }

            pub fn merge_repeated<R: ReadCursor>(
                wire_type: WireType,
                values: &mut Vec<$ty>,
                input: &mut R,
                ctx: DecodeContext,
            ) -> Result<(), ParseFail> {
                if wire_type == WireType::LengthDelimited {
                    let (len, _) = read_len_prefix(input, ctx)?;
                    let limit = input.position() + len;
                    while input.position() < limit {
                        let mut value: $ty = Default::default();
                        merge($wire_type, &mut value, input, ctx)?;
                        values.push(value);
                    }
                    if input.position() != limit {
                        return Err(
                            parse_fail_kind::Malformed::new("delimited length exceeded".into())
                                .into(),
                        );
                    }
                } else {
                    encoding::check_wire_type($wire_type, wire_type, 0)?;
                    let mut value: $ty = Default::default();
                    merge(wire_type, &mut value, input, ctx)?;
                    values.push(value);
                }
                Ok(())
            }

            pub fn encoded_len(tag: u32, _value: &$ty) -> u64 {
                encoding::tag_len(tag) as u64 + $width
            }

            pub fn encoded_len_repeated(tag: u32, values: &[$ty]) -> u64 {
                (encoding::tag_len(tag) as u64 + $width) * values.len() as u64
            }

            pub fn encoded_len_packed(tag: u32, values: &[$ty]) -> u64 {
                if values.is_empty() {
                    return 0;
                }
                let len = values.len() as u64 * $width;
                encoding::tag_len(tag) as u64 + encoding::encoded_len_varint(len) as u64 + len
            }
        }
    };
}

fixed_field!(fixed32, u32, 4, WireType::Fixed32, write_fixed32, read_fixed32);
fixed_field!(fixed64, u64, 8, WireType::Fixed64, write_fixed64, read_fixed64);
fixed_field!(sfixed32, i32, 4, WireType::Fixed32, write_fixed32_signed, read_fixed32_signed);
fixed_field!(sfixed64, i64, 8, WireType::Fixed64, write_fixed64_signed, read_fixed64_signed);
fixed_field!(float, f32, 4, WireType::Fixed32, write_float, read_float);
fixed_field!(double, f64, 8, WireType::Fixed64, write_double, read_double);

/// Bridges the signed/float fixed-width kinds to the cursor traits' `u32`/
/// `u64` primitives via bit-pattern reinterpretation — protobuf's fixed32
/// and fixed64 wire types carry no sign or float information of their own.
trait FixedCursorExt: WriteCursor {
    fn write_fixed32_signed(&mut self, value: i32) -> Result<(), EncodeFail> {
        self.write_fixed32(value as u32)
    }
    fn write_fixed64_signed(&mut self, value: i64) -> Result<(), EncodeFail> {
        self.write_fixed64(value as u64)
    }
    fn write_float(&mut self, value: f32) -> Result<(), EncodeFail> {
        self.write_fixed32(value.to_bits())
    }
    fn write_double(&mut self, value: f64) -> Result<(), EncodeFail> {
        self.write_fixed64(value.to_bits())
    }
}
impl<W: WriteCursor + ?Sized> FixedCursorExt for W {}

trait FixedCursorReadExt: ReadCursor {
    fn read_fixed32_signed(&mut self) -> Result<i32, ParseFail> {
        Ok(self.read_fixed32()? as i32)
    }
    fn read_fixed64_signed(&mut self) -> Result<i64, ParseFail> {
        Ok(self.read_fixed64()? as i64)
    }
    fn read_float(&mut self) -> Result<f32, ParseFail> {
        Ok(f32::from_bits(self.read_fixed32()?))
    }
    fn read_double(&mut self) -> Result<f64, ParseFail> {
        Ok(f64::from_bits(self.read_fixed64()?))
    }
}
impl<R: ReadCursor + ?Sized> FixedCursorReadExt for R {}

/// `string` and `bytes`: length-delimited, materialized into owned storage
/// so the parsed model never borrows from the input cursor (§4.2's "parsers
/// never wrap" invariant).
pub mod bytes_field {
    use super::*;

    pub fn encode<W: WriteCursor>(tag: u32, value: &[u8], out: &mut W) -> Result<(), EncodeFail> {
        out.write_tag(tag, WireType::LengthDelimited)?;
        out.write_varint(value.len() as u64)?;
        out.write_bytes(value)
    }

    pub fn merge<R: ReadCursor>(
        wire_type: WireType,
        value: &mut Vec<u8>,
        input: &mut R,
        ctx: DecodeContext,
    ) -> Result<(), ParseFail> {
        encoding::check_wire_type(WireType::LengthDelimited, wire_type, 0)?;
        let (len, _) = read_len_prefix(input, ctx)?;
        *value = input.read_bytes(len as usize)?.into_owned();
        Ok(())
    }

    pub fn encode_repeated<W: WriteCursor>(
        tag: u32,
        values: &[Vec<u8>],
        out: &mut W,
    ) -> Result<(), EncodeFail> {
        for value in values {
            encode(tag, value, out)?;
        }
        Ok(())
    }

    pub fn merge_repeated<R: ReadCursor>(
        wire_type: WireType,
        values: &mut Vec<Vec<u8>>,
        input: &mut R,
        ctx: DecodeContext,
    ) -> Result<(), ParseFail> {
        let mut value = Vec::new();
        merge(wire_type, &mut value, input, ctx)?;
        values.push(value);
        Ok(())
    }

    pub fn encoded_len(tag: u32, value: &[u8]) -> u64 {
        encoding::tag_len(tag) as u64 + encoding::encoded_len_varint(value.len() as u64) as u64
            + value.len() as u64
    }

    pub fn encoded_len_repeated(tag: u32, values: &[Vec<u8>]) -> u64 {
        values.iter().map(|v| encoded_len(tag, v)).sum()
    }
}

pub mod string_field {
    use super::*;

    pub fn encode<W: WriteCursor>(tag: u32, value: &str, out: &mut W) -> Result<(), EncodeFail> {
        bytes_field::encode(tag, value.as_bytes(), out)
    }

    pub fn merge<R: ReadCursor>(
        wire_type: WireType,
        value: &mut String,
        input: &mut R,
        ctx: DecodeContext,
    ) -> Result<(), ParseFail> {
        let mut raw = Vec::new();
        bytes_field::merge(wire_type, &mut raw, input, ctx)?;
        *value = String::from_utf8(raw)
            .map_err(|_| parse_fail_kind::Malformed::new("invalid utf-8 in string field".into()))?;
        Ok(())
    }

    pub fn encode_repeated<W: WriteCursor>(
        tag: u32,
        values: &[String],
        out: &mut W,
    ) -> Result<(), EncodeFail> {
        for value in values {
            encode(tag, value, out)?;
        }
        Ok(())
    }

    pub fn merge_repeated<R: ReadCursor>(
        wire_type: WireType,
        values: &mut Vec<String>,
        input: &mut R,
        ctx: DecodeContext,
    ) -> Result<(), ParseFail> {
        let mut value = String::new();
        merge(wire_type, &mut value, input, ctx)?;
        values.push(value);
        Ok(())
    }

    pub fn encoded_len(tag: u32, value: &str) -> u64 {
        bytes_field::encoded_len(tag, value.as_bytes())
    }

    pub fn encoded_len_repeated(tag: u32, values: &[String]) -> u64 {
        values.iter().map(|v| encoded_len(tag, v)).sum()
    }
}

/// Nested messages: length-delimited, recursively dispatched through
/// [`crate::message::Message`]. The sub-context's size limit is narrowed to
/// the declared length, so a malformed nested length can never read past
/// its own frame (§4.3's parser state machine).
pub mod message_field {
    use super::*;
    use crate::message::Message;

    pub fn encode<M: Message, W: WriteCursor>(
        tag: u32,
        value: &M,
        out: &mut W,
    ) -> Result<(), EncodeFail> {
        out.write_tag(tag, WireType::LengthDelimited)?;
        out.write_varint(value.measure())?;
        value.write(out)
    }

    pub fn merge<M: Message, R: ReadCursor>(
        wire_type: WireType,
        value: &mut M,
        input: &mut R,
        ctx: DecodeContext,
    ) -> Result<(), ParseFail> {
        encoding::check_wire_type(WireType::LengthDelimited, wire_type, 0)?;
        let (len, outer) = read_len_prefix(input, ctx)?;
        let inner_ctx = outer.enter()?;
        let limit = input.position() + len;
        *value = M::merge_framed(input, inner_ctx, false, limit)?;
        if input.position() != limit {
            return Err(parse_fail_kind::Malformed::new("delimited length exceeded".into()).into());
        }
        Ok(())
    }

    pub fn encode_repeated<M: Message, W: WriteCursor>(
        tag: u32,
        values: &[M],
        out: &mut W,
    ) -> Result<(), EncodeFail> {
        for value in values {
            encode(tag, value, out)?;
        }
        Ok(())
    }

    pub fn merge_repeated<M: Message, R: ReadCursor>(
        wire_type: WireType,
        values: &mut Vec<M>,
        input: &mut R,
        ctx: DecodeContext,
    ) -> Result<(), ParseFail> {
        let mut value = M::default();
        merge(wire_type, &mut value, input, ctx)?;
        values.push(value);
        Ok(())
    }

    pub fn encoded_len<M: Message>(tag: u32, value: &M) -> u64 {
        let len = value.measure();
        encoding::tag_len(tag) as u64 + encoding::encoded_len_varint(len) as u64 + len
    }

    pub fn encoded_len_repeated<M: Message>(tag: u32, values: &[M]) -> u64 {
        values.iter().map(|v| encoded_len(tag, v)).sum()
    }
}

/// Enums: wire-encoded exactly like `int32` (varint, sign-extended for
/// negative ordinals), dispatched through [`crate::schema::EnumValue`]
/// rather than embedding the ordinal directly, so an unrecognized ordinal
/// is a typed `Malformed` failure rather than a silently truncated value.
pub mod enum_field {
    use super::*;
    use crate::schema::EnumValue;

    pub fn encode<E: EnumValue, W: WriteCursor>(tag: u32, value: &E, out: &mut W) -> Result<(), EncodeFail> {
        int32::encode(tag, &value.ordinal(), out)
    }

    pub fn merge<E: EnumValue, R: ReadCursor>(
        wire_type: WireType,
        value: &mut E,
        input: &mut R,
        ctx: DecodeContext,
    ) -> Result<(), ParseFail> {
        let mut ordinal = value.ordinal();
        int32::merge(wire_type, &mut ordinal, input, ctx)?;
        *value = E::from_ordinal(ordinal).ok_or_else(|| {
            ParseFail::from(parse_fail_kind::Malformed::new(format!(
                "unknown enum ordinal {ordinal}"
            )))
        })?;
        Ok(())
    }

    pub fn encode_repeated<E: EnumValue, W: WriteCursor>(
        tag: u32,
        values: &[E],
        out: &mut W,
    ) -> Result<(), EncodeFail> {
        for value in values {
            encode(tag, value, out)?;
        }
        Ok(())
    }

    pub fn encode_packed<E: EnumValue, W: WriteCursor>(
        tag: u32,
        values: &[E],
        out: &mut W,
    ) -> Result<(), EncodeFail> {
        let ordinals: Vec<i32> = values.iter().map(EnumValue::ordinal).collect();
        int32::encode_packed(tag, &ordinals, out)
    }

    pub fn merge_repeated<E: EnumValue, R: ReadCursor>(
        wire_type: WireType,
        values: &mut Vec<E>,
        input: &mut R,
        ctx: DecodeContext,
    ) -> Result<(), ParseFail> {
        let mut ordinals = Vec::new();
        int32::merge_repeated(wire_type, &mut ordinals, input, ctx)?;
        for ordinal in ordinals {
            values.push(E::from_ordinal(ordinal).ok_or_else(|| {
                ParseFail::from(parse_fail_kind::Malformed::new(format!(
                    "unknown enum ordinal {ordinal}"
                )))
            })?);
        }
        Ok(())
    }

    pub fn encoded_len<E: EnumValue>(tag: u32, value: &E) -> u64 {
        int32::encoded_len(tag, &value.ordinal())
    }

    pub fn encoded_len_repeated<E: EnumValue>(tag: u32, values: &[E]) -> u64 {
        values.iter().map(|v| encoded_len(tag, v)).sum()
    }
}

/// Map fields (§3, §4.3): each entry is a synthetic message with field 1 =
/// key, field 2 = value. Backed by `BTreeMap` so iteration order — and
/// therefore encode order — is deterministic (SPEC_FULL.md Open Question
/// 3), unlike `HashMap`'s iteration order.
///
/// Generated code supplies the per-key/per-value encode/merge/length
/// functions, the same way `prost::encoding::btree_map` takes them as
/// closures rather than baking in a fixed key or value kind.
pub mod map_field {
    use super::*;
    use std::collections::BTreeMap;

    #[allow(clippy::too_many_arguments)]
    pub fn encode<K, V, W, KE, KL, VE, VL>(
        tag: u32,
        key_encode: KE,
        key_encoded_len: KL,
        val_encode: VE,
        val_encoded_len: VL,
        values: &BTreeMap<K, V>,
        out: &mut W,
    ) -> Result<(), EncodeFail>
    where
        K: Ord,
        W: WriteCursor,
        KE: Fn(u32, &K, &mut W) -> Result<(), EncodeFail>,
        KL: Fn(u32, &K) -> u64,
        VE: Fn(u32, &V, &mut W) -> Result<(), EncodeFail>,
        VL: Fn(u32, &V) -> u64,
    {
        for (key, value) in values {
            let len = key_encoded_len(1, key) + val_encoded_len(2, value);
            out.write_tag(tag, WireType::LengthDelimited)?;
            out.write_varint(len)?;
            key_encode(1, key, out)?;
            val_encode(2, value, out)?;
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn merge<K, V, R, KM, VM>(
        key_merge: KM,
        val_merge: VM,
        values: &mut BTreeMap<K, V>,
        input: &mut R,
        ctx: DecodeContext,
    ) -> Result<(), ParseFail>
    where
        K: Ord + Default,
        V: Default,
        R: ReadCursor,
        KM: Fn(WireType, &mut K, &mut R, DecodeContext) -> Result<(), ParseFail>,
        VM: Fn(WireType, &mut V, &mut R, DecodeContext) -> Result<(), ParseFail>,
    {
        let (len, outer) = read_len_prefix(input, ctx)?;
        let inner_ctx = outer.enter()?;
        let limit = input.position() + len;
        let mut key = K::default();
        let mut value = V::default();
        while input.position() < limit {
            let (number, wire_type) = input.read_tag()?;
            match number {
                1 => key_merge(wire_type, &mut key, input, inner_ctx)?,
                2 => val_merge(wire_type, &mut value, input, inner_ctx)?,
                _ => crate::message::skip_field(wire_type, input, inner_ctx)?,
            }
        }
        if input.position() != limit {
            return Err(parse_fail_kind::Malformed::new("delimited length exceeded".into()).into());
        }
        values.insert(key, value);
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn encoded_len<K, V, KL, VL>(
        tag: u32,
        key_encoded_len: KL,
        val_encoded_len: VL,
        values: &BTreeMap<K, V>,
    ) -> u64
    where
        K: Ord,
        KL: Fn(u32, &K) -> u64,
        VL: Fn(u32, &V) -> u64,
    {
        let tag_cost = encoding::tag_len(tag) as u64 * values.len() as u64;
        tag_cost
            + values
                .iter()
                .map(|(key, value)| {
                    let len = key_encoded_len(1, key) + val_encoded_len(2, value);
                    encoding::encoded_len_varint(len) as u64 + len
                })
                .sum::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::{BufferedData, SliceCursor};

    #[test]
    fn int32_round_trips_and_omits_on_default_when_caller_skips_it() {
        let mut buf = BufferedData::new();
        int32::encode(3, &42i32, &mut buf).unwrap();
        buf.flip();
        let (number, wire_type) = buf.read_tag().unwrap();
        assert_eq!(number, 3);
        let mut value = 0i32;
        int32::merge(wire_type, &mut value, &mut buf, DecodeContext::new(100, 1 << 20)).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn sint32_zigzags() {
        let mut buf = BufferedData::new();
        sint32::encode(1, &-1i32, &mut buf).unwrap();
        buf.flip();
        let (_, wire_type) = buf.read_tag().unwrap();
        let mut value = 0i32;
        sint32::merge(wire_type, &mut value, &mut buf, DecodeContext::new(100, 1 << 20)).unwrap();
        assert_eq!(value, -1);
    }

    #[test]
    fn packed_and_unpacked_repeated_int32_interchange() {
        let ctx = DecodeContext::new(100, 1 << 20);

        let mut packed = BufferedData::new();
        int32::encode_packed(4, &[1, 2, 3], &mut packed).unwrap();
        packed.flip();
        let (_, wire_type) = packed.read_tag().unwrap();
        let mut from_packed = Vec::new();
        int32::merge_repeated(wire_type, &mut from_packed, &mut packed, ctx).unwrap();

        let mut unpacked = BufferedData::new();
        int32::encode_repeated(4, &[1, 2, 3], &mut unpacked).unwrap();
        unpacked.flip();
        let mut from_unpacked = Vec::new();
        loop {
            if unpacked.remaining() == 0 {
                break;
            }
            let (_, wire_type) = unpacked.read_tag().unwrap();
            int32::merge_repeated(wire_type, &mut from_unpacked, &mut unpacked, ctx).unwrap();
        }

        assert_eq!(from_packed, vec![1, 2, 3]);
        assert_eq!(from_packed, from_unpacked);
    }

    #[test]
    fn string_field_merges_into_owned_storage() {
        let mut buf = BufferedData::new();
        string_field::encode(1, "hello", &mut buf).unwrap();
        let mut backing = buf.as_slice().to_vec();
        buf.flip();
        let (_, wire_type) = buf.read_tag().unwrap();
        let mut value = String::new();
        string_field::merge(wire_type, &mut value, &mut buf, DecodeContext::new(100, 1 << 20))
            .unwrap();
        backing.fill(0xFF);
        assert_eq!(value, "hello");
    }

    #[test]
    fn bytes_field_rejects_truncated_payload() {
        let mut cursor = SliceCursor::new(vec![0x0Au8, 0x05, 1, 2]);
        let (_, wire_type) = cursor.read_tag().unwrap();
        let mut value = Vec::new();
        let result = bytes_field::merge(
            wire_type,
            &mut value,
            &mut cursor,
            DecodeContext::new(100, 1 << 20),
        );
        assert!(result.is_err());
    }

    #[test]
    fn map_field_round_trips_with_deterministic_iteration_order() {
        use std::collections::BTreeMap;

        let mut values: BTreeMap<String, i32> = BTreeMap::new();
        values.insert("b".to_string(), 2);
        values.insert("a".to_string(), 1);

        let mut buf = BufferedData::new();
        map_field::encode(
            6,
            |tag, k: &String, out: &mut BufferedData| string_field::encode(tag, k, out),
            |tag, k: &String| string_field::encoded_len(tag, k),
            |tag, v: &i32, out: &mut BufferedData| int32::encode(tag, v, out),
            |tag, v: &i32| int32::encoded_len(tag, v),
            &values,
            &mut buf,
        )
        .unwrap();
        buf.flip();

        let mut decoded: BTreeMap<String, i32> = BTreeMap::new();
        while buf.remaining() > 0 {
            let (_, wire_type) = buf.read_tag().unwrap();
            map_field::merge(
                |wire_type, k: &mut String, input, ctx| string_field::merge(wire_type, k, input, ctx),
                |wire_type, v: &mut i32, input, ctx| int32::merge(wire_type, v, input, ctx),
                &mut decoded,
                &mut buf,
                DecodeContext::new(100, 1 << 20),
            )
            .unwrap();
            let _ = wire_type;
        }

        assert_eq!(decoded, values);
        let mut iter = decoded.keys();
        assert_eq!(iter.next().unwrap(), "a");
        assert_eq!(iter.next().unwrap(), "b");
    }
}
