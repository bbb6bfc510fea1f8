//! Reads the `pbj.*` custom options (`pbj.comparable`, `pbj.max_size`) off a
//! descriptor's `uninterpreted_option` list.
//!
//! The generator never links against a descriptor pool that knows the
//! `pbj.proto` extension numbers, so these options arrive unresolved, as
//! `UninterpretedOption` entries of the form `(pbj.comparable) = "field_name"`
//! or `(pbj.max_size) = 256`. This is the same representation `protoc` itself
//! uses for any custom option before extension resolution.

use prost_types::UninterpretedOption;

use crate::error::{GeneratorError, UnrecognizedOption};

const PBJ_COMPARABLE: &str = "pbj.comparable";
const PBJ_MAX_SIZE: &str = "pbj.max_size";

fn option_key(option: &UninterpretedOption) -> Option<String> {
    if option.name.len() == 1 && option.name[0].is_extension {
        Some(option.name[0].name_part.clone())
    } else if option.name.len() == 2 && option.name[0].is_extension && option.name[0].name_part == "pbj" {
        Some(format!("pbj.{}", option.name[1].name_part))
    } else {
        None
    }
}

/// Returns the list of field names named in a message's repeated
/// `pbj.comparable` option, or `None` if the message doesn't carry the
/// option at all.
pub fn message_comparable_fields(
    options: &[UninterpretedOption],
    strict: bool,
    message_path: &str,
) -> Result<Option<Vec<String>>, GeneratorError> {
    let mut fields = Vec::new();
    let mut found = false;

    for option in options {
        match option_key(option).as_deref() {
            Some(PBJ_COMPARABLE) => {
                found = true;
                if let Some(value) = &option.string_value {
                    fields.push(String::from_utf8_lossy(value).into_owned());
                } else if let Some(value) = &option.identifier_value {
                    fields.push(value.clone());
                }
            }
            Some(PBJ_MAX_SIZE) => {
                // Not a message-level option; ignored here.
            }
            Some(key) if key.starts_with("pbj.") => {
                if strict {
                    return Err(UnrecognizedOption::new(message_path.to_owned(), key.to_owned()));
                }
                log::warn!("unrecognized pbj.* option {key:?} on {message_path}");
            }
            _ => {}
        }
    }

    Ok(found.then_some(fields))
}

/// Returns the `pbj.max_size` bound declared on a field, if any. This feeds
/// `pbj::schema::FieldDefinition::max_size` directly, so the result is
/// already narrowed to `u32`.
pub fn field_max_size(
    options: &[UninterpretedOption],
    strict: bool,
    field_path: &str,
) -> Result<Option<u32>, GeneratorError> {
    let mut max_size = None;

    for option in options {
        match option_key(option).as_deref() {
            Some(PBJ_MAX_SIZE) => {
                max_size = option.positive_int_value.map(|v| v as u32);
            }
            Some(PBJ_COMPARABLE) => {
                // Not a field-level option; ignored here.
            }
            Some(key) if key.starts_with("pbj.") => {
                if strict {
                    return Err(UnrecognizedOption::new(field_path.to_owned(), key.to_owned()));
                }
                log::warn!("unrecognized pbj.* option {key:?} on {field_path}");
            }
            _ => {}
        }
    }

    Ok(max_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_types::uninterpreted_option::NamePart;

    fn comparable_option(field_name: &str) -> UninterpretedOption {
        UninterpretedOption {
            name: vec![NamePart {
                name_part: PBJ_COMPARABLE.to_owned(),
                is_extension: true,
            }],
            string_value: Some(field_name.as_bytes().to_vec()),
            ..Default::default()
        }
    }

    fn max_size_option(size: u64) -> UninterpretedOption {
        UninterpretedOption {
            name: vec![NamePart {
                name_part: PBJ_MAX_SIZE.to_owned(),
                is_extension: true,
            }],
            positive_int_value: Some(size),
            ..Default::default()
        }
    }

    #[test]
    fn collects_comparable_field_names() {
        let options = vec![comparable_option("a"), comparable_option("b")];
        let fields = message_comparable_fields(&options, true, ".pkg.Msg").unwrap().unwrap();
        assert_eq!(fields, vec!["a".to_owned(), "b".to_owned()]);
    }

    #[test]
    fn absent_comparable_option_is_none() {
        assert_eq!(message_comparable_fields(&[], true, ".pkg.Msg").unwrap(), None);
    }

    #[test]
    fn reads_max_size() {
        let options = vec![max_size_option(256)];
        assert_eq!(field_max_size(&options, true, ".pkg.Msg.f").unwrap(), Some(256u32));
    }

    #[test]
    fn unrecognized_option_is_strict_error() {
        let options = vec![UninterpretedOption {
            name: vec![NamePart {
                name_part: "pbj.frobnicate".to_owned(),
                is_extension: true,
            }],
            ..Default::default()
        }];
        let err = field_max_size(&options, true, ".pkg.Msg.f").unwrap_err();
        assert!(matches!(err, GeneratorError::UnrecognizedOption(_)));
    }
}
