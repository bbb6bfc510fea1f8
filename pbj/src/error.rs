//! Parse and encode errors.

use std::error::Error;
use std::fmt;

pub use parse_fail_kind::ParseFailKind;

/// A Protobuf (or JSON) message parse failure.
///
/// `ParseFail` indicates that the input did not contain a valid encoding of
/// the expected message. The error details should be considered best
/// effort: it is not always possible to pinpoint exactly why a byte stream
/// was rejected.
#[derive(Clone, PartialEq, Eq)]
pub struct ParseFail {
    inner: Box<Inner>,
}

#[derive(Clone, PartialEq, Eq)]
struct Inner {
    kind: ParseFailKind,
    path: ErrorPath,
}

impl ParseFail {
    /// Returns the root-cause kind of this failure.
    pub fn kind(&self) -> &ParseFailKind {
        &self.inner.kind
    }

    /// Returns the logical path (message.field, innermost first) to where
    /// the failure occurred.
    pub fn path(&self) -> &ErrorPath {
        &self.inner.path
    }

    /// Pushes a path segment as the failure unwinds out of a nested `parse`.
    ///
    /// Call this once per enclosing message frame, innermost call first.
    pub fn with_segment(mut self, message: &'static str, field: &'static str) -> Self {
        self.inner
            .path
            .segments
            .insert(0, ErrorPathSegment { message, field });
        self
    }
}

/// Logical path to the field where a [`ParseFail`] occurred.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ErrorPath {
    segments: Vec<ErrorPathSegment>,
}

impl ErrorPath {
    pub fn iter(&self) -> impl Iterator<Item = &ErrorPathSegment> {
        self.segments.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct ErrorPathSegment {
    pub message: &'static str,
    pub field: &'static str,
}

impl fmt::Debug for ParseFail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseFail")
            .field("kind", &self.inner.kind)
            .field("path", &self.inner.path)
            .finish()
    }
}

impl fmt::Display for ParseFail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.kind)?;
        for segment in self.path().iter() {
            write!(f, " (at {}.{})", segment.message, segment.field)?;
        }
        Ok(())
    }
}

impl Error for ParseFail {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(self.inner.kind.inner())
    }
}

impl From<ParseFailKind> for ParseFail {
    fn from(kind: ParseFailKind) -> Self {
        ParseFail {
            inner: Box::new(Inner {
                kind,
                path: ErrorPath::default(),
            }),
        }
    }
}

impl From<std::io::Error> for ParseFail {
    fn from(err: std::io::Error) -> Self {
        parse_fail_kind::IoFail::new(err.to_string()).into()
    }
}

pub mod parse_fail_kind {
    use super::*;
    use crate::encoding::WireType;

    macro_rules! impl_kind {
        {
            $(
                $(#[doc = $doc:literal])?
                #[description($description:literal)]
                pub struct $name:ident {
                    $(
                        #[get($get_ty:ty $(, $get_method:ident)?)]
                        $field:ident: $field_ty:ty
                    ),* $(,)?
                }
            )*
        } => {
            #[derive(Clone, Debug, PartialEq, Eq)]
            #[non_exhaustive]
            pub enum ParseFailKind {
                $($(#[doc = $doc])? $name($name),)*
            }

            impl ParseFailKind {
                pub fn inner(&self) -> &(dyn Error + 'static) {
                    match self {
                        $(Self::$name(inner) => inner,)*
                    }
                }
            }

            impl fmt::Display for ParseFailKind {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    match self {
                        $(Self::$name(inner) => inner.fmt(f),)*
                    }
                }
            }

            $(
                $(#[doc = $doc])?
                #[derive(Debug, Clone, PartialEq, Eq)]
                #[non_exhaustive]
                pub struct $name {
                    $($field: $field_ty,)*
                }

                impl $name {
                    pub fn new($($field: $field_ty,)*) -> Self {
                        Self { $($field,)* }
                    }

                    $(
                        pub fn $field(&self) -> $get_ty {
                            self.$field $(.$get_method())?
                        }
                    )*
                }

                impl fmt::Display for $name {
                    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                        write!(f, $description, $($field = self.$field,)*)
                    }
                }

                impl Error for $name {}

                impl From<$name> for ParseFailKind {
                    fn from(value: $name) -> Self {
                        ParseFailKind::$name(value)
                    }
                }

                impl From<$name> for ParseFail {
                    fn from(value: $name) -> Self {
                        ParseFail::from(ParseFailKind::from(value))
                    }
                }
            )*
        };
    }

    impl_kind! {
        /// Varint overrun, truncated field, invalid wire type, forbidden field number.
        #[description("malformed input: {reason}")]
        pub struct Malformed {
            #[get(&str, as_str)]
            reason: String,
        }

        /// Tag's wire type disagrees with the schema's expected wire type.
        #[description("wire type mismatch for field {field}: got {actual:?}, expected {expected:?}")]
        pub struct WireTypeMismatch {
            #[get(u32)]
            field: u32,
            #[get(WireType)]
            actual: WireType,
            #[get(WireType)]
            expected: WireType,
        }

        /// Field number absent from the schema, rejected by a strict parse.
        #[description("unknown field number {field}")]
        pub struct UnknownField {
            #[get(u32)]
            field: u32,
        }

        /// Nested-message recursion exceeded `max_depth`.
        #[description("depth exceeded: limit was {limit}")]
        pub struct DepthExceeded {
            #[get(u32)]
            limit: u32,
        }

        /// A length-delimited payload exceeded `max_size`.
        #[description("size exceeded: declared length {declared} exceeds limit {limit}")]
        pub struct SizeExceeded {
            #[get(u64)]
            declared: u64,
            #[get(u64)]
            limit: u64,
        }

        /// The underlying cursor or stream failed.
        #[description("io failure: {reason}")]
        pub struct IoFail {
            #[get(&str, as_str)]
            reason: String,
        }
    }
}

/// A Protobuf message encoding failure.
///
/// Encoding is infallible except when the destination cursor runs out of
/// room, or the underlying stream fails.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EncodeFail {
    /// The destination buffer had insufficient remaining capacity.
    Capacity { required: usize, remaining: usize },
    /// The underlying stream failed.
    IoFail(String),
}

impl fmt::Display for EncodeFail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeFail::Capacity {
                required,
                remaining,
            } => write!(
                f,
                "insufficient buffer capacity (required: {required}, remaining: {remaining})"
            ),
            EncodeFail::IoFail(reason) => write!(f, "io failure: {reason}"),
        }
    }
}

impl Error for EncodeFail {}

impl From<std::io::Error> for EncodeFail {
    fn from(err: std::io::Error) -> Self {
        EncodeFail::IoFail(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_path_segments() {
        let fail: ParseFail = parse_fail_kind::Malformed::new("truncated varint".into()).into();
        let fail = fail.with_segment("pkg.Outer", "inner");
        let fail = fail.with_segment("pkg.Inner", "value");
        assert_eq!(
            fail.to_string(),
            "malformed input: truncated varint (at pkg.Inner.value) (at pkg.Outer.inner)"
        );
    }

    #[test]
    fn kind_accessor_round_trips() {
        let fail: ParseFail = parse_fail_kind::UnknownField::new(19999).into();
        match fail.kind() {
            ParseFailKind::UnknownField(f) => assert_eq!(f.field(), 19999),
            other => panic!("unexpected kind: {other:?}"),
        }
    }
}
