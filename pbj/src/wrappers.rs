//! `Message` implementations for the scalar types backing proto3's
//! optional-wrapper messages (`google.protobuf.Int32Value` and friends).
//!
//! A generated `optional_wrapper` field is modeled directly as `Option<T>`
//! for the bare Rust scalar `T` (§3); encoding the wrapper submessage
//! itself is just encoding `T` through [`crate::message::Message`] via
//! [`crate::codec::protobuf::message_field`], the same way `prost`
//! implements `Message` for `bool`/`u32`/`i32`/… directly instead of
//! introducing separate wrapper structs.

use crate::buffer::{ReadCursor, WriteCursor};
use crate::codec::protobuf::{bool_field, bytes_field, double, float, int32, int64, string_field, uint32, uint64};
use crate::encoding::{DecodeContext, WireType};
use crate::error::{EncodeFail, ParseFail};
use crate::message::{skip_field, Message};
use crate::schema::{FieldDefinition, FieldKind, Schema};

macro_rules! wrapper_message {
    ($ty:ty, $field_kind:expr, $codec:ident, $message_name:literal) => {
        impl Message for $ty {
            fn schema() -> &'static Schema {
                static FIELDS: &[FieldDefinition] = &[FieldDefinition {
                    number: 1,
                    name: "value",
                    json_name: "value",
                    kind: $field_kind,
                    repeated: false,
                    optional_wrapper: false,
                    oneof_group: None,
                    max_size: None,
                    packed: true,
                }];
                static SCHEMA: Schema = Schema::new($message_name, FIELDS);
                &SCHEMA
            }

            fn write_fields<W: WriteCursor>(&self, out: &mut W) -> Result<(), EncodeFail> {
                if *self != <$ty>::default() {
                    $codec::encode(1, self, out)?;
                }
                Ok(())
            }

            fn measure_fields(&self) -> u64 {
                if *self != <$ty>::default() {
                    $codec::encoded_len(1, self)
                } else {
                    0
                }
            }

            fn merge_field<R: ReadCursor>(
                &mut self,
                number: u32,
                wire_type: WireType,
                input: &mut R,
                ctx: DecodeContext,
            ) -> Result<(), ParseFail> {
                match number {
                    1 => $codec::merge(wire_type, self, input, ctx),
                    _ => skip_field(wire_type, input, ctx),
                }
            }
        }
    };
}

wrapper_message!(bool, FieldKind::Bool, bool_field, "BoolValue");
wrapper_message!(i32, FieldKind::Int32, int32, "Int32Value");
wrapper_message!(i64, FieldKind::Int64, int64, "Int64Value");
wrapper_message!(u32, FieldKind::UInt32, uint32, "UInt32Value");
wrapper_message!(u64, FieldKind::UInt64, uint64, "UInt64Value");
wrapper_message!(f32, FieldKind::Float, float, "FloatValue");
wrapper_message!(f64, FieldKind::Double, double, "DoubleValue");

impl Message for String {
    fn schema() -> &'static Schema {
        static FIELDS: &[FieldDefinition] = &[FieldDefinition {
            number: 1,
            name: "value",
            json_name: "value",
            kind: FieldKind::String,
            repeated: false,
            optional_wrapper: false,
            oneof_group: None,
            max_size: None,
            packed: true,
        }];
        static SCHEMA: Schema = Schema::new("StringValue", FIELDS);
        &SCHEMA
    }

    fn write_fields<W: WriteCursor>(&self, out: &mut W) -> Result<(), EncodeFail> {
        if !self.is_empty() {
            string_field::encode(1, self, out)?;
        }
        Ok(())
    }

    fn measure_fields(&self) -> u64 {
        if !self.is_empty() {
            string_field::encoded_len(1, self)
        } else {
            0
        }
    }

    fn merge_field<R: ReadCursor>(
        &mut self,
        number: u32,
        wire_type: WireType,
        input: &mut R,
        ctx: DecodeContext,
    ) -> Result<(), ParseFail> {
        match number {
            1 => string_field::merge(wire_type, self, input, ctx),
            _ => skip_field(wire_type, input, ctx),
        }
    }
}

impl Message for Vec<u8> {
    fn schema() -> &'static Schema {
        static FIELDS: &[FieldDefinition] = &[FieldDefinition {
            number: 1,
            name: "value",
            json_name: "value",
            kind: FieldKind::Bytes,
            repeated: false,
            optional_wrapper: false,
            oneof_group: None,
            max_size: None,
            packed: true,
        }];
        static SCHEMA: Schema = Schema::new("BytesValue", FIELDS);
        &SCHEMA
    }

    fn write_fields<W: WriteCursor>(&self, out: &mut W) -> Result<(), EncodeFail> {
        if !self.is_empty() {
            bytes_field::encode(1, self, out)?;
        }
        Ok(())
    }

    fn measure_fields(&self) -> u64 {
        if !self.is_empty() {
            bytes_field::encoded_len(1, self)
        } else {
            0
        }
    }

    fn merge_field<R: ReadCursor>(
        &mut self,
        number: u32,
        wire_type: WireType,
        input: &mut R,
        ctx: DecodeContext,
    ) -> Result<(), ParseFail> {
        match number {
            1 => bytes_field::merge(wire_type, self, input, ctx),
            _ => skip_field(wire_type, input, ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BufferedData;

    #[test]
    fn int32_value_round_trips_some_zero_distinctly_from_none() {
        let some_zero: Option<i32> = Some(0);
        let mut buf = BufferedData::new();
        if let Some(inner) = &some_zero {
            crate::codec::protobuf::message_field::encode(5, inner, &mut buf).unwrap();
        }
        assert!(buf.as_slice().len() > 0, "Some(zero) must still write the wrapper tag");
    }

    #[test]
    fn string_value_omits_empty_but_keeps_the_wrapper_distinction() {
        assert_eq!(String::new().measure(), 0);
        assert_eq!("hi".to_string().measure(), string_field::encoded_len(1, "hi"));
    }
}
