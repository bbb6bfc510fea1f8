//! Schema runtime (§3, §4.4 item 2): per-message field metadata supplied by
//! the generator. The schema is the single source of truth for field
//! metadata — codecs never embed a literal tag number outside a schema
//! lookup.

use crate::encoding::WireType;
use crate::oneof::OneofGroupId;

/// The declared protobuf type of a field.
///
/// `E` and `M` are left generic over the generated enum/message marker
/// types so that `FieldKind` can be embedded directly in a `'static`
/// schema table without indirection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Int32,
    Int64,
    UInt32,
    UInt64,
    SInt32,
    SInt64,
    Fixed32,
    Fixed64,
    SFixed32,
    SFixed64,
    Float,
    Double,
    Bool,
    String,
    Bytes,
    /// Holds the generated enum type's name, for diagnostics only; decoding
    /// dispatches through the generated `from_ordinal`/`from_name`, not
    /// through this table.
    Enum(&'static str),
    /// Holds the generated message type's name, for diagnostics only.
    Message(&'static str),
    /// A map field; `key` is restricted to integer, bool, or string kinds
    /// and is enforced by the generator, not at runtime.
    Map(&'static MapKind),
}

#[derive(Debug, PartialEq, Eq)]
pub struct MapKind {
    pub key: FieldKind,
    pub value: FieldKind,
}

impl FieldKind {
    /// The wire type used to encode a single (unpacked) instance of this
    /// field kind.
    pub const fn wire_type(&self) -> WireType {
        match self {
            FieldKind::Int32
            | FieldKind::Int64
            | FieldKind::UInt32
            | FieldKind::UInt64
            | FieldKind::SInt32
            | FieldKind::SInt64
            | FieldKind::Bool
            | FieldKind::Enum(_) => WireType::Varint,
            FieldKind::Fixed64 | FieldKind::SFixed64 | FieldKind::Double => WireType::Fixed64,
            FieldKind::Fixed32 | FieldKind::SFixed32 | FieldKind::Float => WireType::Fixed32,
            FieldKind::String | FieldKind::Bytes | FieldKind::Message(_) | FieldKind::Map(_) => {
                WireType::LengthDelimited
            }
        }
    }

    /// Whether a repeated field of this kind may use the packed
    /// length-delimited encoding (every kind except the already
    /// length-delimited ones: string, bytes, message, map).
    pub const fn is_packable(&self) -> bool {
        !matches!(
            self,
            FieldKind::String | FieldKind::Bytes | FieldKind::Message(_) | FieldKind::Map(_)
        )
    }
}

/// Static metadata for one field of a generated message.
#[derive(Debug)]
pub struct FieldDefinition {
    /// Field number; invariant: `1 <= number <= 2^29 - 1`, and not in
    /// `19000..=19999`.
    pub number: u32,
    pub name: &'static str,
    /// Field name converted to lowerCamelCase, precomputed by the
    /// generator for the JSON codec (§4.3).
    pub json_name: &'static str,
    pub kind: FieldKind,
    pub repeated: bool,
    /// `true` if this field is the payload of a `google.protobuf.*Value`
    /// wrapper carried as `Option<T>` (§3).
    pub optional_wrapper: bool,
    /// Set when the field is a member of a oneof group; members sharing a
    /// group id are mutually exclusive on the wire.
    pub oneof_group: Option<OneofGroupId>,
    /// Per-field override of the parse-call `max_size` limit
    /// (`pbj.max_size` option, §6).
    pub max_size: Option<u32>,
    /// Whether a packable repeated field is written packed. Ignored for
    /// non-packable kinds. Defaults to `true` (see SPEC_FULL.md Open
    /// Question 2); the generator can override it per field.
    pub packed: bool,
}

impl FieldDefinition {
    pub const fn is_valid_number(number: u32) -> bool {
        crate::encoding::is_valid_field_number(number)
    }
}

/// The ordered field table for one generated message, plus a fast
/// `number -> definition` lookup.
///
/// Schemas are generated as `'static` constants; there is no runtime
/// mutation (§9: "Global mutable state: None").
#[derive(Debug)]
pub struct Schema {
    pub message_name: &'static str,
    pub fields: &'static [FieldDefinition],
}

impl Schema {
    pub const fn new(message_name: &'static str, fields: &'static [FieldDefinition]) -> Self {
        Schema {
            message_name,
            fields,
        }
    }

    /// Looks up a field definition by wire field number.
    ///
    /// Fields are typically few enough (protobuf schemas rarely exceed a
    /// few dozen fields per message) that a linear scan over the static
    /// slice outperforms building a hash map at startup; this mirrors how
    /// the generator lays the table out in declaration order for
    /// deterministic iteration during encode.
    pub fn lookup(&self, number: u32) -> Option<&'static FieldDefinition> {
        self.fields.iter().find(|f| f.number == number)
    }

    /// Whether `number` is a field of this message.
    pub fn valid(&self, number: u32) -> bool {
        self.lookup(number).is_some()
    }

    /// Looks up a field definition by its JSON name, for the JSON codec's
    /// unknown-key check (§4.3).
    pub fn lookup_by_json_name(&self, json_name: &str) -> Option<&'static FieldDefinition> {
        self.fields.iter().find(|f| f.json_name == json_name)
    }

    /// Fields in ascending field-number order, for deterministic encode
    /// (§4.3: "Fields are written in ascending field-number order").
    pub fn fields_in_number_order(&self) -> impl Iterator<Item = &'static FieldDefinition> {
        // Generated tables are already declaration-ordered, which the
        // generator guarantees equals field-number order (see pbj-gen's
        // code_generator, which sorts field cases by number at emission
        // time); this iterator documents that invariant rather than
        // re-sorting at runtime.
        self.fields.iter()
    }
}

/// Implemented by every generated enum type. `UNSET = -1` is reserved for
/// enums used as a oneof discriminator (§4.4 item 8); plain field enums
/// never produce it from [`EnumValue::from_ordinal`] unless the `.proto`
/// itself declares a zero-valued member named that way.
pub trait EnumValue: Copy + Eq + 'static {
    fn ordinal(&self) -> i32;
    fn name(&self) -> &'static str;
    fn from_ordinal(ordinal: i32) -> Option<Self>;
    fn from_name(name: &str) -> Option<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    static FIELDS: &[FieldDefinition] = &[
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

    #[test]
    fn lookup_and_valid() {
        let schema = Schema::new("Timestamp", FIELDS);
        assert!(schema.valid(1));
        assert!(schema.valid(2));
        assert!(!schema.valid(3));
        assert_eq!(schema.lookup(2).unwrap().name, "nanos");
    }

    #[test]
    fn wire_types_match_the_fixed_table() {
        assert_eq!(FieldKind::Int32.wire_type(), WireType::Varint);
        assert_eq!(FieldKind::Fixed64.wire_type(), WireType::Fixed64);
        assert_eq!(FieldKind::String.wire_type(), WireType::LengthDelimited);
        assert_eq!(FieldKind::Float.wire_type(), WireType::Fixed32);
    }
}
