use crate::error::{parse_fail_kind, ParseFail};

/// The wire type of an encoded field, carried in the low 3 bits of a tag.
///
/// Proto3 forbids groups; [`WireType::StartGroup`] and [`WireType::EndGroup`]
/// are recognized only so that a tag carrying them can be rejected as
/// malformed rather than misread as a different wire type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    StartGroup = 3,
    EndGroup = 4,
    Fixed32 = 5,
}

impl TryFrom<u64> for WireType {
    type Error = ParseFail;

    #[inline]
    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            3 => Ok(WireType::StartGroup),
            4 => Ok(WireType::EndGroup),
            5 => Ok(WireType::Fixed32),
            _ => Err(parse_fail_kind::Malformed::new(format!(
                "invalid wire type value: {value}"
            ))
            .into()),
        }
    }
}

/// Checks that the expected wire type matches the actual wire type for
/// `field`, or returns a [`ParseFailKind::WireTypeMismatch`](crate::error::ParseFailKind::WireTypeMismatch).
#[inline]
pub fn check_wire_type(expected: WireType, actual: WireType, field: u32) -> Result<(), ParseFail> {
    if expected != actual {
        return Err(parse_fail_kind::WireTypeMismatch::new(field, actual, expected).into());
    }
    Ok(())
}

/// Rejects a group wire type (3 or 4), which proto3 does not support.
#[inline]
pub fn reject_group(wire_type: WireType) -> Result<(), ParseFail> {
    match wire_type {
        WireType::StartGroup | WireType::EndGroup => {
            Err(parse_fail_kind::Malformed::new("groups are not supported in proto3".into()).into())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_known_values() {
        for (value, expected) in [
            (0u64, WireType::Varint),
            (1, WireType::Fixed64),
            (2, WireType::LengthDelimited),
            (3, WireType::StartGroup),
            (4, WireType::EndGroup),
            (5, WireType::Fixed32),
        ] {
            assert_eq!(WireType::try_from(value).unwrap(), expected);
        }
        assert!(WireType::try_from(6).is_err());
    }

    #[test]
    fn groups_are_rejected() {
        assert!(reject_group(WireType::StartGroup).is_err());
        assert!(reject_group(WireType::EndGroup).is_err());
        assert!(reject_group(WireType::Varint).is_ok());
    }
}
