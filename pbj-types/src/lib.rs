//! Well-known Protocol Buffers v3 types: `Timestamp`, `Duration`, and `Any`.
//!
//! These are the one place in this crate family where message types are
//! hand-written rather than emitted by `pbj-gen`: `google.protobuf.proto`
//! ships no generator input of its own, so the `Message` impls below are
//! written by hand in exactly the shape `pbj-gen` would emit for an
//! equivalent two-field or two-field message.

use std::fmt;
use std::str::FromStr;
use std::time;

use pbj::buffer::{ReadCursor, WriteCursor};
use pbj::codec::protobuf::{bytes_field, int32, int64, string_field};
use pbj::encoding::DecodeContext;
use pbj::encoding::WireType;
use pbj::error::{EncodeFail, ParseFail};
use pbj::message::Message;
use pbj::schema::{FieldDefinition, FieldKind, Schema};

mod any;
mod datetime;
mod duration;
mod timestamp;
mod type_url;

pub use duration::DurationError;
pub use timestamp::TimestampError;

use type_url::type_url_for;

const NANOS_PER_SECOND: i32 = 1_000_000_000;
const NANOS_MAX: i32 = NANOS_PER_SECOND - 1;

const PACKAGE: &str = "google.protobuf";

/// Identifies a generated message's fully qualified Protobuf name, the way
/// `Any` packing needs to when it builds or checks a `type_url`.
pub trait Name {
    const PACKAGE: &'static str;
    const NAME: &'static str;

    fn type_url() -> String;
}

/// `google.protobuf.Timestamp`: a signed count of seconds and nanoseconds
/// since the Unix epoch.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

static TIMESTAMP_FIELDS: &[FieldDefinition] = &[
    FieldDefinition {
        number: 1,
        name: "seconds",
        json_name: "seconds",
        kind: FieldKind::Int64,
        repeated: false,
        optional_wrapper: false,
        oneof_group: None,
        max_size: None,
        packed: true,
    },
    FieldDefinition {
        number: 2,
        name: "nanos",
        json_name: "nanos",
        kind: FieldKind::Int32,
        repeated: false,
        optional_wrapper: false,
        oneof_group: None,
        max_size: None,
        packed: true,
    },
];

static TIMESTAMP_SCHEMA: Schema = Schema::new("Timestamp", TIMESTAMP_FIELDS);

impl Message for Timestamp {
    fn schema() -> &'static Schema {
        &TIMESTAMP_SCHEMA
    }

    fn write_fields<W: WriteCursor>(&self, out: &mut W) -> Result<(), EncodeFail> {
        if self.seconds != 0 {
            int64::encode(1, &self.seconds, out)?;
        }
        if self.nanos != 0 {
            int32::encode(2, &self.nanos, out)?;
        }
        Ok(())
    }

    fn measure_fields(&self) -> u64 {
        let mut len = 0;
        if self.seconds != 0 {
            len += int64::encoded_len(1, &self.seconds);
        }
        if self.nanos != 0 {
            len += int32::encoded_len(2, &self.nanos);
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
            1 => int64::merge(wire_type, &mut self.seconds, input, ctx),
            2 => int32::merge(wire_type, &mut self.nanos, input, ctx),
            _ => unreachable!("looked up against schema first"),
        }
    }
}

/// `google.protobuf.Duration`: a signed, fixed-length span of time.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct Duration {
    pub seconds: i64,
    pub nanos: i32,
}

static DURATION_FIELDS: &[FieldDefinition] = &[
    FieldDefinition {
        number: 1,
        name: "seconds",
        json_name: "seconds",
        kind: FieldKind::Int64,
        repeated: false,
        optional_wrapper: false,
        oneof_group: None,
        max_size: None,
        packed: true,
    },
    FieldDefinition {
        number: 2,
        name: "nanos",
        json_name: "nanos",
        kind: FieldKind::Int32,
        repeated: false,
        optional_wrapper: false,
        oneof_group: None,
        max_size: None,
        packed: true,
    },
];

static DURATION_SCHEMA: Schema = Schema::new("Duration", DURATION_FIELDS);

impl Message for Duration {
    fn schema() -> &'static Schema {
        &DURATION_SCHEMA
    }

    fn write_fields<W: WriteCursor>(&self, out: &mut W) -> Result<(), EncodeFail> {
        if self.seconds != 0 {
            int64::encode(1, &self.seconds, out)?;
        }
        if self.nanos != 0 {
            int32::encode(2, &self.nanos, out)?;
        }
        Ok(())
    }

    fn measure_fields(&self) -> u64 {
        let mut len = 0;
        if self.seconds != 0 {
            len += int64::encoded_len(1, &self.seconds);
        }
        if self.nanos != 0 {
            len += int32::encoded_len(2, &self.nanos);
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
            1 => int64::merge(wire_type, &mut self.seconds, input, ctx),
            2 => int32::merge(wire_type, &mut self.nanos, input, ctx),
            _ => unreachable!("looked up against schema first"),
        }
    }
}

/// `google.protobuf.Any`: a type-tagged, opaque serialized message.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Any {
    pub type_url: String,
    pub value: Vec<u8>,
}

static ANY_FIELDS: &[FieldDefinition] = &[
    FieldDefinition {
        number: 1,
        name: "type_url",
        json_name: "typeUrl",
        kind: FieldKind::String,
        repeated: false,
        optional_wrapper: false,
        oneof_group: None,
        max_size: None,
        packed: true,
    },
    FieldDefinition {
        number: 2,
        name: "value",
        json_name: "value",
        kind: FieldKind::Bytes,
        repeated: false,
        optional_wrapper: false,
        oneof_group: None,
        max_size: None,
        packed: true,
    },
];

static ANY_SCHEMA: Schema = Schema::new("Any", ANY_FIELDS);

impl Message for Any {
    fn schema() -> &'static Schema {
        &ANY_SCHEMA
    }

    fn write_fields<W: WriteCursor>(&self, out: &mut W) -> Result<(), EncodeFail> {
        if !self.type_url.is_empty() {
            string_field::encode(1, &self.type_url, out)?;
        }
        if !self.value.is_empty() {
            bytes_field::encode(2, &self.value, out)?;
        }
        Ok(())
    }

    fn measure_fields(&self) -> u64 {
        let mut len = 0;
        if !self.type_url.is_empty() {
            len += string_field::encoded_len(1, &self.type_url);
        }
        if !self.value.is_empty() {
            len += bytes_field::encoded_len(2, &self.value);
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
            1 => string_field::merge(wire_type, &mut self.type_url, input, ctx),
            2 => bytes_field::merge(wire_type, &mut self.value, input, ctx),
            _ => unreachable!("looked up against schema first"),
        }
    }
}

impl Name for Timestamp {
    const PACKAGE: &'static str = PACKAGE;
    const NAME: &'static str = "Timestamp";

    fn type_url() -> String {
        type_url_for::<Self>()
    }
}

impl Name for Duration {
    const PACKAGE: &'static str = PACKAGE;
    const NAME: &'static str = "Duration";

    fn type_url() -> String {
        type_url_for::<Self>()
    }
}

impl Name for Any {
    const PACKAGE: &'static str = PACKAGE;
    const NAME: &'static str = "Any";

    fn type_url() -> String {
        type_url_for::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_round_trips_through_bytes() {
        let original = Timestamp {
            seconds: 5678,
            nanos: 1234,
        };
        let bytes = original.to_bytes().unwrap();
        assert_eq!(&bytes[..], &[0x08, 0xae, 0x2c, 0x10, 0xd2, 0x09][..]);
        let mut cursor = pbj::buffer::SliceCursor::new(bytes);
        assert_eq!(Timestamp::parse(&mut cursor).unwrap(), original);
    }

    #[test]
    fn duration_round_trips_through_bytes() {
        let original = Duration {
            seconds: -5,
            nanos: -500_000_000,
        };
        let bytes = original.to_bytes().unwrap();
        let mut cursor = pbj::buffer::SliceCursor::new(bytes);
        assert_eq!(Duration::parse(&mut cursor).unwrap(), original);
    }

    #[test]
    fn any_round_trips_an_arbitrary_payload() {
        let original = Any {
            type_url: "type.googleapis.com/google.protobuf.Timestamp".to_string(),
            value: vec![1, 2, 3],
        };
        let bytes = original.to_bytes().unwrap();
        let mut cursor = pbj::buffer::SliceCursor::new(bytes);
        assert_eq!(Any::parse(&mut cursor).unwrap(), original);
    }
}
