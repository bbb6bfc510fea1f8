//! Canonical protobuf-JSON helpers (§4.3): one function pair per JSON
//! representation a `FieldKind` maps to. Unlike the binary codec, JSON has
//! no wire type to dispatch on — `int32`, `sint32`, `sfixed32` all render
//! as a bare JSON number, so these helpers are grouped by JSON shape
//! (`i32`/`i64`/`u32`/`u64`/`f32`/`f64`/`bool`/`string`/`bytes`) rather than
//! by protobuf wire kind.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::{Map, Number, Value};

use crate::encoding::DecodeContext;
use crate::error::{parse_fail_kind, ParseFail};
use crate::schema::EnumValue;

fn malformed(reason: impl Into<String>) -> ParseFail {
    parse_fail_kind::Malformed::new(reason.into()).into()
}

pub mod i32_json {
    use super::*;

    pub fn to_value(value: i32) -> Value {
        Value::Number(Number::from(value))
    }

    pub fn from_value(value: &Value) -> Result<i32, ParseFail> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(|| malformed("int32 out of range")),
            Value::String(s) => s.parse().map_err(|_| malformed("invalid int32 string")),
            _ => Err(malformed("expected a number or numeric string for int32")),
        }
    }
}

pub mod i64_json {
    use super::*;

    /// 64-bit integers are always emitted as quoted decimal strings.
    pub fn to_value(value: i64) -> Value {
        Value::String(value.to_string())
    }

    pub fn from_value(value: &Value) -> Result<i64, ParseFail> {
        match value {
            Value::String(s) => s.parse().map_err(|_| malformed("invalid int64 string")),
            Value::Number(n) => n.as_i64().ok_or_else(|| malformed("int64 out of range")),
            _ => Err(malformed("expected a quoted string or number for int64")),
        }
    }
}

pub mod u32_json {
    use super::*;

    pub fn to_value(value: u32) -> Value {
        Value::Number(Number::from(value))
    }

    pub fn from_value(value: &Value) -> Result<u32, ParseFail> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| malformed("uint32 out of range")),
            Value::String(s) => s.parse().map_err(|_| malformed("invalid uint32 string")),
            _ => Err(malformed("expected a number or numeric string for uint32")),
        }
    }
}

pub mod u64_json {
    use super::*;

    pub fn to_value(value: u64) -> Value {
        Value::String(value.to_string())
    }

    pub fn from_value(value: &Value) -> Result<u64, ParseFail> {
        match value {
            Value::String(s) => s.parse().map_err(|_| malformed("invalid uint64 string")),
            Value::Number(n) => n.as_u64().ok_or_else(|| malformed("uint64 out of range")),
            _ => Err(malformed("expected a quoted string or number for uint64")),
        }
    }
}

pub mod bool_json {
    use super::*;

    pub fn to_value(value: bool) -> Value {
        Value::Bool(value)
    }

    pub fn from_value(value: &Value) -> Result<bool, ParseFail> {
        value.as_bool().ok_or_else(|| malformed("expected a JSON boolean"))
    }
}

pub mod f32_json {
    use super::*;

    pub fn to_value(value: f32) -> Value {
        if value.is_finite() {
            Number::from_f64(f64::from(value))
                .map(Value::Number)
                .unwrap_or(Value::Null)
        } else if value.is_nan() {
            Value::String("NaN".to_string())
        } else if value > 0.0 {
            Value::String("Infinity".to_string())
        } else {
            Value::String("-Infinity".to_string())
        }
    }

    pub fn from_value(value: &Value) -> Result<f32, ParseFail> {
        match value {
            Value::Number(n) => n.as_f64().map(|v| v as f32).ok_or_else(|| malformed("invalid float")),
            Value::String(s) => match s.as_str() {
                "NaN" => Ok(f32::NAN),
                "Infinity" => Ok(f32::INFINITY),
                "-Infinity" => Ok(f32::NEG_INFINITY),
                other => other.parse().map_err(|_| malformed("invalid float string")),
            },
            _ => Err(malformed("expected a number or special string for float")),
        }
    }
}

pub mod f64_json {
    use super::*;

    pub fn to_value(value: f64) -> Value {
        if value.is_finite() {
            Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
        } else if value.is_nan() {
            Value::String("NaN".to_string())
        } else if value > 0.0 {
            Value::String("Infinity".to_string())
        } else {
            Value::String("-Infinity".to_string())
        }
    }

    pub fn from_value(value: &Value) -> Result<f64, ParseFail> {
        match value {
            Value::Number(n) => n.as_f64().ok_or_else(|| malformed("invalid double")),
            Value::String(s) => match s.as_str() {
                "NaN" => Ok(f64::NAN),
                "Infinity" => Ok(f64::INFINITY),
                "-Infinity" => Ok(f64::NEG_INFINITY),
                other => other.parse().map_err(|_| malformed("invalid double string")),
            },
            _ => Err(malformed("expected a number or special string for double")),
        }
    }
}

pub mod string_json {
    use super::*;

    pub fn to_value(value: &str) -> Value {
        Value::String(value.to_string())
    }

    pub fn from_value(value: &Value) -> Result<String, ParseFail> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| malformed("expected a JSON string"))
    }
}

/// `bytes` is Base64. The size bound applies to the *decoded* length; the
/// limit checked against the encoded string length is doubled first, so
/// the check still rejects an oversized payload before the (larger)
/// allocation for decoding happens (§4.3: "for base-64-encoded JSON the
/// limit is scaled by 2").
pub mod bytes_json {
    use super::*;

    pub fn to_value(value: &[u8]) -> Value {
        Value::String(BASE64.encode(value))
    }

    pub fn from_value(value: &Value, ctx: DecodeContext) -> Result<Vec<u8>, ParseFail> {
        let encoded = value.as_str().ok_or_else(|| malformed("expected a base64 JSON string"))?;
        ctx.check_size(encoded.len() as u64 * 2)?;
        BASE64
            .decode(encoded)
            .map_err(|_| malformed("invalid base64 in bytes field"))
    }
}

/// Enums are emitted by name; the parser accepts either the declared name
/// or the numeric ordinal (§4.3).
pub mod enum_json {
    use super::*;

    pub fn to_value<E: EnumValue>(value: &E) -> Value {
        Value::String(value.name().to_string())
    }

    pub fn from_value<E: EnumValue>(value: &Value) -> Result<E, ParseFail> {
        match value {
            Value::String(name) => {
                E::from_name(name).ok_or_else(|| malformed(format!("unknown enum name {name:?}")))
            }
            Value::Number(n) => {
                let ordinal = n.as_i64().and_then(|v| i32::try_from(v).ok()).ok_or_else(|| {
                    malformed("enum ordinal out of range")
                })?;
                E::from_ordinal(ordinal)
                    .ok_or_else(|| malformed(format!("unknown enum ordinal {ordinal}")))
            }
            _ => Err(malformed("expected an enum name or ordinal")),
        }
    }
}

/// Implemented by generated message types alongside
/// [`crate::message::Message`]; provides the canonical-JSON mirror of the
/// binary codec.
pub trait JsonMessage: Sized + Default {
    fn write_json_fields(&self, map: &mut Map<String, Value>);

    fn merge_json_field(
        &mut self,
        json_name: &str,
        value: &Value,
        ctx: DecodeContext,
    ) -> Result<(), ParseFail>;

    fn schema_for_json() -> &'static crate::schema::Schema;

    fn write_json(&self) -> Value {
        let mut map = Map::new();
        self.write_json_fields(&mut map);
        Value::Object(map)
    }

    fn parse_json(value: &Value) -> Result<Self, ParseFail> {
        Self::parse_json_bounded(
            value,
            false,
            crate::message::DEFAULT_MAX_DEPTH,
            crate::message::DEFAULT_MAX_SIZE,
        )
    }

    fn parse_json_strict(value: &Value) -> Result<Self, ParseFail> {
        Self::parse_json_bounded(
            value,
            true,
            crate::message::DEFAULT_MAX_DEPTH,
            crate::message::DEFAULT_MAX_SIZE,
        )
    }

    fn parse_json_bounded(
        value: &Value,
        strict: bool,
        max_depth: u32,
        max_size: u64,
    ) -> Result<Self, ParseFail> {
        let ctx = DecodeContext::new(max_depth, max_size);
        let object = value
            .as_object()
            .ok_or_else(|| malformed("expected a JSON object"))?;
        let mut message = Self::default();
        for (key, value) in object {
            match Self::schema_for_json().lookup_by_json_name(key) {
                Some(_) => message.merge_json_field(key, value, ctx)?,
                None => {
                    if strict {
                        return Err(malformed(format!("unknown JSON field {key:?}")));
                    }
                }
            }
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int64_round_trips_as_a_quoted_string() {
        let value = i64_json::to_value(-42);
        assert_eq!(value, Value::String("-42".to_string()));
        assert_eq!(i64_json::from_value(&value).unwrap(), -42);
    }

    #[test]
    fn bytes_are_base64() {
        let value = bytes_json::to_value(&[0, 1, 2, 3]);
        assert_eq!(value, Value::String("AAECAw==".to_string()));
        let ctx = DecodeContext::new(100, 1 << 20);
        assert_eq!(bytes_json::from_value(&value, ctx).unwrap(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn oversized_base64_is_rejected_before_decode() {
        let huge = "A".repeat(64);
        let value = Value::String(huge);
        let ctx = DecodeContext::new(100, 16);
        assert!(bytes_json::from_value(&value, ctx).is_err());
    }

    #[test]
    fn float_specials_round_trip_through_strings() {
        let nan = f64_json::to_value(f64::NAN);
        assert_eq!(nan, Value::String("NaN".to_string()));
        assert!(f64_json::from_value(&nan).unwrap().is_nan());
    }
}
