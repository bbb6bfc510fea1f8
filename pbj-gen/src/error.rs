//! The generator's own error type (§7): a closed enum of structs, the same
//! recipe `pbj::error::{ParseFail, EncodeFail}` uses for the runtime.

use std::fmt;

use crate::fully_qualified_name::FullyQualifiedName;

/// Failure to generate code for a `.proto` input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    /// A type reference could not be resolved against the file's imports
    /// and declared package.
    UnresolvedReference(UnresolvedReference),
    /// Two messages with the same fully qualified name were emitted from
    /// the same generator invocation.
    DuplicateMessage(DuplicateMessage),
    /// A field number is repeated within one message's schema.
    DuplicateFieldNumber(DuplicateFieldNumber),
    /// `pbj.comparable` named a field that is repeated or otherwise not
    /// comparable.
    NonComparableField(NonComparableField),
    /// Two artifacts were generated at the same output path.
    DuplicateArtifact(DuplicateArtifact),
    /// A `pbj.*` custom option key was not recognized (§6, §9 Open
    /// Question: unrecognized `pbj.*` options are strict errors).
    UnrecognizedOption(UnrecognizedOption),
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeneratorError::UnresolvedReference(e) => e.fmt(f),
            GeneratorError::DuplicateMessage(e) => e.fmt(f),
            GeneratorError::DuplicateFieldNumber(e) => e.fmt(f),
            GeneratorError::NonComparableField(e) => e.fmt(f),
            GeneratorError::DuplicateArtifact(e) => e.fmt(f),
            GeneratorError::UnrecognizedOption(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for GeneratorError {}

macro_rules! kind {
    ($name:ident { $($field:ident : $ty:ty),* $(,)? }, $fmt:expr) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            $(pub $field: $ty),*
        }

        impl $name {
            pub fn new($($field: $ty),*) -> GeneratorError {
                GeneratorError::$name(Self { $($field),* })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                #[allow(unused_variables)]
                let Self { $($field),* } = self;
                write!(f, $fmt)
            }
        }
    };
}

kind!(
    UnresolvedReference { type_name: String, referenced_from: String },
    "unresolved type reference {type_name:?} (referenced from {referenced_from})"
);

kind!(
    DuplicateMessage { name: String },
    "duplicate message name {name:?} emitted from this generator invocation"
);

kind!(
    DuplicateFieldNumber { message: String, number: u32 },
    "duplicate field number {number} in message {message:?}"
);

kind!(
    NonComparableField { message: String, field: String, reason: String },
    "field {field:?} of message {message:?} cannot be used in pbj.comparable: {reason}"
);

kind!(
    DuplicateArtifact { path: String },
    "two artifacts were generated at output path {path:?}"
);

kind!(
    UnrecognizedOption { path: String, key: String },
    "unrecognized pbj.* option {key:?} on {path}"
);

impl UnresolvedReference {
    pub fn at(type_name: impl Into<String>, referenced_from: &FullyQualifiedName) -> GeneratorError {
        UnresolvedReference::new(type_name.into(), referenced_from.as_ref().to_string())
    }
}
