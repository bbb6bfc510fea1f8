//! Wire-format runtime for Protocol Buffers v3.
//!
//! This crate is the runtime half of the toolkit: cursors over bytes
//! ([`buffer`]), the wire primitives built on top of them ([`encoding`]),
//! per-message schema metadata ([`schema`]), the `OneOf` value container
//! ([`oneof`]), the `Message` codec contract ([`message`], [`codec`]), and
//! the fixed equality/hashing recipes generated code relies on
//! ([`equality`]). The companion `pbj-gen` crate emits the generated types
//! that implement [`message::Message`] against this runtime.

pub use bytes;

pub mod buffer;
pub mod codec;
pub mod encoding;
pub mod equality;
pub mod error;
pub mod message;
pub mod oneof;
pub mod schema;
pub mod wrappers;

pub use crate::error::{EncodeFail, ErrorPath, ErrorPathSegment, ParseFail};
pub use crate::message::Message;
pub use crate::oneof::{OneOf, OneofGroupId, UnsetDiscriminant};
pub use crate::schema::{EnumValue, FieldDefinition, FieldKind, MapKind, Schema};

#[cfg(feature = "serde-json")]
pub use crate::codec::json::JsonMessage;
