//! The per-message codec contract (§4.3): `write`, `measure`, `parse`,
//! `parse_strict`, a bounded `parse`, and `to_bytes`. Generated message
//! types implement [`Message`] by providing `write_fields`/`measure_fields`
//! (dispatch over their own field list) and `merge_field` (dispatch by
//! field number, looked up in [`Schema`] first); the default methods here
//! supply the tag loop, the strict/non-strict branch, and the
//! depth/size-bounded entry points, the same way `prost::Message` supplies
//! `encode`/`decode` around a derived `encode_raw`/`merge_field`.

use bytes::Bytes;

use crate::buffer::{BufferedData, ReadCursor, WriteCursor};
use crate::encoding::{self, DecodeContext, WireType};
use crate::error::{parse_fail_kind, EncodeFail, ParseFail};
use crate::schema::Schema;

/// Default recursion limit for `parse`/`parse_strict`, matching the
/// protobuf C++ implementation's default (§9).
pub const DEFAULT_MAX_DEPTH: u32 = 100;

/// Default length-delimited size limit for `parse`/`parse_strict`: 64 MiB.
pub const DEFAULT_MAX_SIZE: u64 = 64 * 1024 * 1024;

/// A generated Protocol Buffers message.
pub trait Message: Sized + Default {
    /// The message's field schema (§3).
    fn schema() -> &'static Schema;

    /// Writes every present field, in ascending field-number order,
    /// omitting defaults per §4.3.
    fn write_fields<W: WriteCursor>(&self, out: &mut W) -> Result<(), EncodeFail>;

    /// Exact encoded length of [`Message::write_fields`]'s output.
    fn measure_fields(&self) -> u64;

    /// Merges one field, already known to belong to this message's schema,
    /// into `self`.
    fn merge_field<R: ReadCursor>(
        &mut self,
        number: u32,
        wire_type: WireType,
        input: &mut R,
        ctx: DecodeContext,
    ) -> Result<(), ParseFail>;

    /// Writes the message body (no outer length delimiter).
    fn write<W: WriteCursor>(&self, out: &mut W) -> Result<(), EncodeFail> {
        self.write_fields(out)
    }

    /// The exact byte length [`Message::write`] would produce.
    fn measure(&self) -> u64 {
        self.measure_fields()
    }

    /// Parses a message, skipping unknown fields, with the default depth
    /// and size bounds.
    fn parse<R: ReadCursor>(input: &mut R) -> Result<Self, ParseFail> {
        Self::parse_bounded(input, false, DEFAULT_MAX_DEPTH, DEFAULT_MAX_SIZE)
    }

    /// Parses a message, rejecting unknown fields, with the default depth
    /// and size bounds.
    fn parse_strict<R: ReadCursor>(input: &mut R) -> Result<Self, ParseFail> {
        Self::parse_bounded(input, true, DEFAULT_MAX_DEPTH, DEFAULT_MAX_SIZE)
    }

    /// Parses a message with explicit bounds.
    fn parse_bounded<R: ReadCursor>(
        input: &mut R,
        strict: bool,
        max_depth: u32,
        max_size: u64,
    ) -> Result<Self, ParseFail> {
        let ctx = DecodeContext::new(max_depth, max_size);
        let limit = input.position().saturating_add(input.remaining());
        Self::merge_framed(input, ctx, strict, limit)
    }

    /// Parses fields until `input.position() == limit`. The entry point
    /// for both top-level parses (`limit` = end of the whole cursor) and
    /// nested messages (`limit` = the length-delimited sub-frame's end);
    /// see [`crate::codec::protobuf::message_field::merge`].
    fn merge_framed<R: ReadCursor>(
        input: &mut R,
        ctx: DecodeContext,
        strict: bool,
        limit: u64,
    ) -> Result<Self, ParseFail> {
        let mut message = Self::default();
        while input.position() < limit {
            let (number, wire_type) = input.read_tag()?;
            match Self::schema().lookup(number) {
                Some(_) => message.merge_field(number, wire_type, input, ctx)?,
                None => {
                    if strict {
                        return Err(parse_fail_kind::UnknownField::new(number).into());
                    }
                    skip_field(wire_type, input, ctx)?;
                }
            }
        }
        Ok(message)
    }

    /// Encodes to a freshly allocated, exactly sized `Bytes`.
    fn to_bytes(&self) -> Result<Bytes, EncodeFail> {
        let mut buf = BufferedData::with_capacity(self.measure() as usize);
        self.write(&mut buf)?;
        Ok(Bytes::from(buf.into_vec()))
    }

    /// Writes a length prefix followed by the message body.
    fn encode_length_delimited<W: WriteCursor>(&self, out: &mut W) -> Result<(), EncodeFail> {
        out.write_varint(self.measure())?;
        self.write(out)
    }

    /// Reads a length prefix, then parses exactly that many bytes as a
    /// message body.
    fn decode_length_delimited<R: ReadCursor>(input: &mut R) -> Result<Self, ParseFail> {
        Self::decode_length_delimited_bounded(input, false, DEFAULT_MAX_DEPTH, DEFAULT_MAX_SIZE)
    }

    fn decode_length_delimited_bounded<R: ReadCursor>(
        input: &mut R,
        strict: bool,
        max_depth: u32,
        max_size: u64,
    ) -> Result<Self, ParseFail> {
        let ctx = DecodeContext::new(max_depth, max_size);
        let len = input.read_varint()?;
        ctx.check_size(len)?;
        let limit = input.position() + len;
        let message = Self::merge_framed(input, ctx.enter()?, strict, limit)?;
        if input.position() != limit {
            return Err(parse_fail_kind::Malformed::new("delimited length exceeded".into()).into());
        }
        Ok(message)
    }
}

/// Skips one field's payload on a [`ReadCursor`], honoring `ctx`'s size
/// bound for length-delimited fields. Groups are always rejected (proto3).
pub fn skip_field<R: ReadCursor>(
    wire_type: WireType,
    input: &mut R,
    ctx: DecodeContext,
) -> Result<(), ParseFail> {
    encoding::reject_group(wire_type)?;
    match wire_type {
        WireType::Varint => {
            input.read_varint()?;
        }
        WireType::Fixed32 => {
            input.read_fixed32()?;
        }
        WireType::Fixed64 => {
            input.read_fixed64()?;
        }
        WireType::LengthDelimited => {
            let len = input.read_varint()?;
            ctx.check_size(len)?;
            input.skip(len)?;
        }
        WireType::StartGroup | WireType::EndGroup => unreachable!("rejected above"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::SliceCursor;
    use crate::codec::protobuf::{int32, string_field};
    use crate::schema::{FieldDefinition, FieldKind, Schema};

    #[derive(Default, Debug, PartialEq, Eq)]
    struct Pair {
        id: i32,
        name: String,
    }

    static PAIR_FIELDS: &[FieldDefinition] = &[
        FieldDefinition {
            number: 1,
            name: "id",
            json_name: "id",
            kind: FieldKind::Int32,
            repeated: false,
            optional_wrapper: false,
            oneof_group: None,
            max_size: None,
            packed: true,
        },
        FieldDefinition {
            number: 2,
            name: "name",
            json_name: "name",
            kind: FieldKind::String,
            repeated: false,
            optional_wrapper: false,
            oneof_group: None,
            max_size: None,
            packed: true,
        },
    ];

    static PAIR_SCHEMA: Schema = Schema::new("Pair", PAIR_FIELDS);

    impl Message for Pair {
        fn schema() -> &'static Schema {
            &PAIR_SCHEMA
        }

        fn write_fields<W: WriteCursor>(&self, out: &mut W) -> Result<(), EncodeFail> {
            if self.id != 0 {
                int32::encode(1, &self.id, out)?;
            }
            if !self.name.is_empty() {
                string_field::encode(2, &self.name, out)?;
            }
            Ok(())
        }

        fn measure_fields(&self) -> u64 {
            let mut len = 0;
            if self.id != 0 {
                len += int32::encoded_len(1, &self.id);
            }
            if !self.name.is_empty() {
                len += string_field::encoded_len(2, &self.name);
            }
            len
        }

        fn merge_field<R: ReadCursor>(
            &mut self,
            number: u32,
            wire_type: WireType,
            input: &mut R,
            ctx: DecodeContext,
        ) -> Result<(), ParseFail> {
            match number {
                1 => int32::merge(wire_type, &mut self.id, input, ctx),
                2 => string_field::merge(wire_type, &mut self.name, input, ctx),
                _ => unreachable!("looked up against schema first"),
            }
        }
    }

    #[test]
    fn round_trips_through_write_and_parse() {
        let original = Pair {
            id: 7,
            name: "Gala".to_string(),
        };
        let bytes = original.to_bytes().unwrap();
        let mut cursor = SliceCursor::new(bytes);
        let parsed = Pair::parse(&mut cursor).unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn measure_agrees_with_write() {
        let value = Pair {
            id: 1,
            name: "x".to_string(),
        };
        assert_eq!(value.measure(), value.to_bytes().unwrap().len() as u64);
    }

    #[test]
    fn default_fields_are_omitted() {
        let value = Pair::default();
        assert_eq!(value.measure(), 0);
    }

    #[test]
    fn strict_parse_rejects_unknown_fields() {
        let mut buf = BufferedData::new();
        int32::encode(1, &1i32, &mut buf).unwrap();
        int32::encode(99, &2i32, &mut buf).unwrap();
        buf.flip();
        assert!(Pair::parse(&mut buf.clone()).is_ok());
        assert!(Pair::parse_strict(&mut buf).is_err());
    }

    #[test]
    fn length_delimited_round_trip() {
        let original = Pair {
            id: 3,
            name: "nested".to_string(),
        };
        let mut buf = BufferedData::new();
        original.encode_length_delimited(&mut buf).unwrap();
        buf.flip();
        let parsed = Pair::decode_length_delimited(&mut buf).unwrap();
        assert_eq!(original, parsed);
    }
}
