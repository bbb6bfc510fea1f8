//! Compiles `.proto` files into the `model`/`schema`/`codec` source that
//! `pbj`'s runtime trait impls are written against.
//!
//! `pbj-gen` is designed to run at build time, driven from a crate's
//! `build.rs`, the same way a `prost-build` invocation would be. Given a
//! pre-parsed `FileDescriptorSet` (or a set of already-parsed
//! `FileDescriptorProto`s from a `protoc --descriptor_set_out` run), it
//! produces one Rust source file per `.proto` package plus a sibling
//! test-argument-factory file.

mod ast;
mod code_generator;
mod config;
mod context;
mod error;
mod extern_paths;
mod fully_qualified_name;
mod ident;
mod json;
mod message_graph;
mod module;
mod options;
mod path;

pub use ast::Comments;
pub use config::{Config, GeneratedModule};
pub use error::GeneratorError;
pub use fully_qualified_name::FullyQualifiedName;
pub use module::Module;
