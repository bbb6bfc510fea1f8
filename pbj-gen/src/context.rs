use std::borrow::Cow;

use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::FieldDescriptorProto;

use crate::config::Config;
use crate::extern_paths::ExternPaths;
use crate::message_graph::MessageGraph;

/// The context providing all the global information needed to generate code.
///
/// A `Context` is built once per generator invocation and shared by the
/// `CodeGenerator` instances created for each input file.
pub struct Context<'a> {
    config: &'a Config,
    message_graph: &'a MessageGraph,
    extern_paths: &'a ExternPaths,
    known_packages: &'a [String],
}

impl<'a> Context<'a> {
    pub fn new(
        config: &'a Config,
        message_graph: &'a MessageGraph,
        extern_paths: &'a ExternPaths,
        known_packages: &'a [String],
    ) -> Self {
        Self {
            config,
            message_graph,
            extern_paths,
            known_packages,
        }
    }

    /// Splits a fully-qualified type name into its owning package (the
    /// longest package declared by any file in this generator invocation
    /// that prefixes it) and the remaining type path within that package.
    pub fn split_package(&self, fq_type_name: &str) -> (String, String) {
        let trimmed = fq_type_name.trim_start_matches('.');
        let mut best = "";
        for pkg in self.known_packages {
            if pkg.is_empty() {
                continue;
            }
            let matches = trimmed == pkg || trimmed.starts_with(&format!("{pkg}."));
            if matches && pkg.len() > best.len() {
                best = pkg;
            }
        }
        let rest = if best.is_empty() {
            trimmed.to_string()
        } else {
            trimmed[best.len() + 1..].to_string()
        };
        (best.to_string(), rest)
    }

    pub fn config(&self) -> &Config {
        self.config
    }

    /// The path to the runtime crate the generated code is written against.
    pub fn runtime_path(&self) -> &str {
        self.config.runtime_path.as_deref().unwrap_or("::pbj")
    }

    pub fn resolve_extern_ident(&self, pb_ident: &str) -> Option<crate::extern_paths::ResolvedPath> {
        self.extern_paths.resolve_ident(pb_ident)
    }

    pub fn type_attributes(&self, fq_type_name: &str) -> impl Iterator<Item = &str> {
        self.config.type_attributes.get(fq_type_name).into_iter().flat_map(|v| v.iter().map(String::as_str))
    }

    pub fn message_attributes(&self, fq_message_name: &str) -> impl Iterator<Item = &str> {
        self.config.message_attributes.get(fq_message_name).into_iter().flat_map(|v| v.iter().map(String::as_str))
    }

    pub fn enum_attributes(&self, fq_enum_name: &str) -> impl Iterator<Item = &str> {
        self.config.enum_attributes.get(fq_enum_name).into_iter().flat_map(|v| v.iter().map(String::as_str))
    }

    pub fn field_attributes(&self, fq_message_name: &str, field_name: &str) -> impl Iterator<Item = &str> {
        self.config
            .field_attributes
            .get_field(fq_message_name, field_name)
            .into_iter()
            .flat_map(|v| v.iter().map(String::as_str))
    }

    /// Returns whether the Rust type for this message field needs to be `Box<_>`.
    ///
    /// Either explicitly configured with `Config::boxed`, or forced because the type of a
    /// non-repeated message field transitively contains the message itself.
    pub fn should_box_message_field(&self, fq_message_name: &str, field: &FieldDescriptorProto) -> bool {
        self.should_box_impl(fq_message_name, None, field)
    }

    pub fn should_box_oneof_field(
        &self,
        fq_message_name: &str,
        oneof_name: &str,
        field: &FieldDescriptorProto,
    ) -> bool {
        self.should_box_impl(fq_message_name, Some(oneof_name), field)
    }

    fn should_box_impl(&self, fq_message_name: &str, oneof: Option<&str>, field: &FieldDescriptorProto) -> bool {
        let repeated = field.label() == Label::Repeated;
        let fd_type = field.r#type();
        if !repeated && fd_type == Type::Message && self.message_graph.is_nested(field.type_name(), fq_message_name) {
            return true;
        }
        let config_path = match oneof {
            None => Cow::Borrowed(fq_message_name),
            Some(oneof_name) => Cow::Owned(format!("{fq_message_name}.{oneof_name}")),
        };
        !repeated && self.config.boxed.get_field(&config_path, field.name()).is_some()
    }

    pub fn can_message_derive_copy(&self, fq_message_name: &str) -> bool {
        self.message_graph.can_message_derive_copy(fq_message_name)
    }

    pub fn can_field_derive_copy(&self, fq_message_name: &str, field: &FieldDescriptorProto) -> bool {
        self.message_graph.can_field_derive_copy(fq_message_name, field)
    }

    pub fn should_disable_comments(&self, fq_message_name: &str, field_name: Option<&str>) -> bool {
        match field_name {
            Some(field_name) => self.config.disable_comments.get_field(fq_message_name, field_name).is_some(),
            None => self.config.disable_comments.get(fq_message_name).is_some(),
        }
    }

    pub fn should_skip_debug(&self, fq_message_name: &str) -> bool {
        assert_eq!(b'.', fq_message_name.as_bytes()[0]);
        self.config.skip_debug.get(fq_message_name).is_some()
    }

    pub fn type_name_domain(&self, fq_message_name: &str) -> &str {
        self.config.type_name_domains.get(fq_message_name).map_or("", |s| s.as_str())
    }

    pub fn emit_json(&self) -> bool {
        self.config.emit_json
    }
}
