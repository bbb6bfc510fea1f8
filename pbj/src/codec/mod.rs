//! Per-`FieldKind` codec dispatch tables, one module per wire
//! representation. Generated `write_fields`/`merge_field` bodies call these
//! directly; [`crate::message::Message`] supplies the tag loop around them.

#[cfg(feature = "serde-json")]
pub mod json;
pub mod protobuf;
