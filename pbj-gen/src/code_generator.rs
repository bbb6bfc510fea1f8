//! Emits `model`/`schema`/`codec` (and, when enabled, `json`) source for one
//! `.proto` file's messages, enums, and oneofs (§3, §4, §4.4), plus a
//! companion buffer of `samples_*` test-argument factories for each message.
//!
//! Nested message/enum types are flattened into top-level items named by
//! concatenating their enclosing path (`Outer.Inner` -> `OuterInner`)
//! instead of mirrored as Rust submodules; this keeps the emitted
//! `model`/`schema`/`codec` triple flat and simple to cross-reference from
//! the hand-written codec dispatch, at the cost of not reusing a nested
//! type's bare name the way `protoc`-derived nesting would.

use std::collections::HashSet;
use std::fmt::Write as _;

use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, OneofDescriptorProto,
};

use crate::config::GeneratedModule;
use crate::context::Context;
use crate::error::{
    DuplicateFieldNumber, DuplicateMessage, GeneratorError, NonComparableField, UnresolvedReference,
};
use crate::fully_qualified_name::FullyQualifiedName;
use crate::ident::{strip_enum_prefix, to_snake, to_upper_camel};
use crate::json::json_name_for_field;
use crate::options;

/// One message field, resolved against the schema and ready for emission.
struct ResolvedField<'a> {
    proto: &'a FieldDescriptorProto,
    rust_name: String,
    rust_type: String,
    /// The field's type before any `Vec`/`Option`/`BTreeMap` wrapping is
    /// applied — the element type for repeated fields, the payload type for
    /// optional-wrapper fields, or `rust_type` itself otherwise.
    inner_type: String,
    kind_expr: String,
    codec_mod: String,
    is_message: bool,
    /// `true` when `is_message` resolved through `Context::resolve_extern_ident`
    /// to a type this generator doesn't also emit a `Builder` for (e.g.
    /// `pbj_types::Timestamp`), as opposed to a plain message generated in
    /// this same pass.
    is_extern_message: bool,
    is_enum: bool,
    is_map: bool,
    is_optional_wrapper: bool,
    proto3_optional: bool,
    max_size: Option<u32>,
    packed: bool,
    oneof_group: Option<String>,
    json_name: String,
    /// Set only when `is_map`.
    map_codecs: Option<MapCodecs>,
}

/// Per-field codec info for a map field's key and value kinds.
struct MapCodecs {
    key_codec: String,
    value_codec: String,
    value_is_message: bool,
    /// `pbj::codec::json` module name for the value kind (message values
    /// dispatch through `JsonMessage` instead and never read this).
    value_json_mod: &'static str,
    /// Sample key/value expressions for `emit_test_factory`'s corpus.
    key_sample: String,
    value_sample: String,
}

/// A field's resolved non-repeated, non-map-wrapped Rust type, plus the
/// `FieldKind` constructor expression and codec module to dispatch through.
struct ResolvedFieldType {
    rust_type: String,
    /// Mirrors `ResolvedField::inner_type`: `rust_type` before any
    /// repeated/optional/map wrapping.
    inner_type: String,
    kind_expr: String,
    codec_mod: String,
    is_message: bool,
    is_extern_message: bool,
    is_enum: bool,
    is_map: bool,
    is_optional_wrapper: bool,
    /// Set only when `is_map`.
    map_codecs: Option<MapCodecs>,
}

/// The key/value field descriptors of a synthetic map-entry message,
/// looked up by the entry message's fully-qualified name.
type MapEntries = std::collections::HashMap<String, (FieldDescriptorProto, FieldDescriptorProto)>;

fn collect_map_entries(package: &str, type_path: &[String], message: &DescriptorProto, out: &mut MapEntries) {
    if message.options.as_ref().map(|o| o.map_entry()).unwrap_or(false) {
        let fq = FullyQualifiedName::new(package, type_path, message.name());
        let key = message.field.iter().find(|f| f.number() == 1).cloned();
        let value = message.field.iter().find(|f| f.number() == 2).cloned();
        if let (Some(key), Some(value)) = (key, value) {
            out.insert(fq.as_ref().to_owned(), (key, value));
        }
    }
    let mut nested_path = type_path.to_vec();
    nested_path.push(message.name().to_owned());
    for nested in &message.nested_type {
        collect_map_entries(package, &nested_path, nested, out);
    }
}

pub struct CodeGenerator<'ctx> {
    context: &'ctx Context<'ctx>,
    package: String,
    map_entries: MapEntries,
    model: String,
    schema: String,
    codec: String,
    json: String,
    test_factory: String,
}

impl<'ctx> CodeGenerator<'ctx> {
    pub fn generate(
        context: &Context,
        seen_messages: &mut HashSet<String>,
        file: FileDescriptorProto,
    ) -> Result<(GeneratedModule, String), GeneratorError> {
        let mut map_entries = MapEntries::new();
        let package = file.package.clone().unwrap_or_default();
        for message in &file.message_type {
            collect_map_entries(&package, &[], message, &mut map_entries);
        }

        let mut gen = CodeGenerator {
            context,
            package,
            map_entries,
            model: String::new(),
            schema: String::new(),
            codec: String::new(),
            json: String::new(),
            test_factory: String::new(),
        };

        let package_fqn = FullyQualifiedName::new(&gen.package, &[] as &[&str], "");

        for message in &file.message_type {
            gen.push_message(seen_messages, &package_fqn, &[], message)?;
        }
        for enum_type in &file.enum_type {
            gen.push_enum(&package_fqn, &[], enum_type)?;
        }

        let generated = GeneratedModule {
            model: gen.model,
            schema: gen.schema,
            codec: gen.codec,
            json: if context.emit_json() { Some(gen.json) } else { None },
        };
        Ok((generated, gen.test_factory))
    }

    fn push_message(
        &mut self,
        seen_messages: &mut HashSet<String>,
        package_fqn: &FullyQualifiedName,
        type_path: &[String],
        message: &DescriptorProto,
    ) -> Result<(), GeneratorError> {
        if message.options.as_ref().map(|o| o.map_entry()).unwrap_or(false) {
            // Map-entry synthetic messages are handled directly by the
            // containing field's map-kind resolution.
            return Ok(());
        }

        let name = message.name();
        let fq_name = FullyQualifiedName::new(package_fqn.as_ref(), type_path, name);
        let rust_name = flattened_name(type_path, name);

        if !seen_messages.insert(fq_name.as_ref().to_owned()) {
            return Err(DuplicateMessage::new(fq_name.as_ref().to_owned()));
        }

        let mut nested_type_path: Vec<String> = type_path.to_vec();
        nested_type_path.push(name.to_owned());

        for nested in &message.nested_type {
            self.push_message(seen_messages, package_fqn, &nested_type_path, nested)?;
        }
        for nested_enum in &message.enum_type {
            self.push_enum(package_fqn, &nested_type_path, nested_enum)?;
        }

        let oneofs: Vec<&OneofDescriptorProto> = message.oneof_decl.iter().collect();
        let mut resolved_fields = self.resolve_fields(&fq_name, message, &oneofs)?;
        // Encode/measure/schema dispatch assumes ascending field-number
        // order (see pbj::schema::Schema::fields_in_number_order); .proto
        // source can declare fields out of number order, so re-sort here
        // rather than trusting declaration order.
        resolved_fields.sort_by_key(|f| f.proto.number());

        self.emit_struct(&rust_name, &resolved_fields, &oneofs)?;
        self.emit_schema(&fq_name, &rust_name, &resolved_fields)?;
        self.emit_message_impl(&rust_name, &resolved_fields)?;
        if self.context.emit_json() {
            self.emit_json_impl(&rust_name, &resolved_fields)?;
        }
        self.emit_equality_impls(&fq_name, &rust_name, message, &resolved_fields)?;
        self.emit_builder(&rust_name, &resolved_fields)?;
        self.emit_test_factory(&rust_name, &resolved_fields);

        Ok(())
    }

    fn resolve_fields<'a>(
        &self,
        fq_name: &FullyQualifiedName,
        message: &'a DescriptorProto,
        oneofs: &[&'a OneofDescriptorProto],
    ) -> Result<Vec<ResolvedField<'a>>, GeneratorError> {
        let mut seen_numbers = HashSet::new();
        let mut fields = Vec::with_capacity(message.field.len());

        for field in &message.field {
            if !seen_numbers.insert(field.number()) {
                return Err(DuplicateFieldNumber::new(
                    fq_name.as_ref().to_owned(),
                    field.number() as u32,
                ));
            }

            let repeated = field.label() == Label::Repeated;
            let proto3_optional = field.proto3_optional();
            let oneof_group = if proto3_optional {
                None
            } else {
                field
                    .oneof_index
                    .map(|idx| oneofs[idx as usize].name().to_owned())
            };

            let field_path = format!("{}.{}", fq_name.as_ref(), field.name());
            let field_options = field.options.as_ref();
            let uninterpreted = field_options.map(|o| o.uninterpreted_option.as_slice()).unwrap_or(&[]);
            let strict = self.context.config().strict_options;
            let max_size = options::field_max_size(uninterpreted, strict, &field_path)?;
            let explicit_packed = field_options.and_then(|o| o.packed);

            let resolved = self.resolve_field_type(fq_name, field)?;

            let packable = is_packable(field);
            let packed = explicit_packed.unwrap_or(packable && repeated);

            fields.push(ResolvedField {
                proto: field,
                rust_name: to_snake(field.name()),
                rust_type: wrap_type(&resolved.rust_type, repeated, resolved.is_map, proto3_optional, resolved.is_optional_wrapper),
                inner_type: resolved.inner_type,
                kind_expr: resolved.kind_expr,
                codec_mod: resolved.codec_mod,
                is_message: resolved.is_message,
                is_extern_message: resolved.is_extern_message,
                is_enum: resolved.is_enum,
                is_map: resolved.is_map,
                is_optional_wrapper: resolved.is_optional_wrapper,
                proto3_optional,
                max_size,
                packed,
                oneof_group,
                json_name: json_name_for_field(field.name(), field.json_name.as_deref()),
                map_codecs: resolved.map_codecs,
            });
        }

        Ok(fields)
    }

    /// Resolves a field's non-repeated, non-map-wrapped Rust type, along
    /// with the `FieldKind` constructor expression and codec module to
    /// dispatch through.
    fn resolve_field_type(
        &self,
        fq_name: &FullyQualifiedName,
        field: &FieldDescriptorProto,
    ) -> Result<ResolvedFieldType, GeneratorError> {
        use Type::*;

        let scalar = |rust_type: &str, kind: &str, codec_mod: &str| ResolvedFieldType {
            rust_type: rust_type.to_owned(),
            inner_type: rust_type.to_owned(),
            kind_expr: kind.to_owned(),
            codec_mod: codec_mod.to_owned(),
            is_message: false,
            is_extern_message: false,
            is_enum: false,
            is_map: false,
            is_optional_wrapper: false,
            map_codecs: None,
        };

        match field.r#type() {
            Double => Ok(scalar("f64", "FieldKind::Double", "double")),
            Float => Ok(scalar("f32", "FieldKind::Float", "float")),
            Int64 => Ok(scalar("i64", "FieldKind::Int64", "int64")),
            Uint64 => Ok(scalar("u64", "FieldKind::UInt64", "uint64")),
            Int32 => Ok(scalar("i32", "FieldKind::Int32", "int32")),
            Fixed64 => Ok(scalar("u64", "FieldKind::Fixed64", "fixed64")),
            Fixed32 => Ok(scalar("u32", "FieldKind::Fixed32", "fixed32")),
            Bool => Ok(scalar("bool", "FieldKind::Bool", "bool_field")),
            String => Ok(scalar("::std::string::String", "FieldKind::String", "string_field")),
            Bytes => Ok(scalar("::std::vec::Vec<u8>", "FieldKind::Bytes", "bytes_field")),
            Uint32 => Ok(scalar("u32", "FieldKind::UInt32", "uint32")),
            Sfixed32 => Ok(scalar("i32", "FieldKind::SFixed32", "sfixed32")),
            Sfixed64 => Ok(scalar("i64", "FieldKind::SFixed64", "sfixed64")),
            Sint32 => Ok(scalar("i32", "FieldKind::SInt32", "sint32")),
            Sint64 => Ok(scalar("i64", "FieldKind::SInt64", "sint64")),
            Group => Err(UnresolvedReference::at("group fields are not supported", fq_name)),
            Enum => {
                let type_name = field.type_name();
                let rust_type = self.resolve_type_path(type_name);
                Ok(ResolvedFieldType {
                    rust_type: rust_type.clone(),
                    inner_type: rust_type,
                    kind_expr: format!("FieldKind::Enum({:?})", type_name),
                    codec_mod: "enum_field".into(),
                    is_message: false,
                    is_extern_message: false,
                    is_enum: true,
                    is_map: false,
                    is_optional_wrapper: false,
                    map_codecs: None,
                })
            }
            Message => {
                let type_name = field.type_name();
                if let Some((key_field, value_field)) = self.map_entries.get(type_name).cloned() {
                    let key = self.resolve_field_type(fq_name, &key_field)?;
                    let value = self.resolve_field_type(fq_name, &value_field)?;
                    let rust_type = format!("::std::collections::BTreeMap<{}, {}>", key.rust_type, value.rust_type);
                    let kind_expr = format!(
                        "FieldKind::Map(&::pbj::schema::MapKind {{ key: ::pbj::schema::{}, value: ::pbj::schema::{} }})",
                        key.kind_expr, value.kind_expr
                    );
                    return Ok(ResolvedFieldType {
                        rust_type: rust_type.clone(),
                        inner_type: rust_type,
                        kind_expr,
                        codec_mod: "map_field".into(),
                        is_message: false,
                        is_extern_message: false,
                        is_enum: false,
                        is_map: true,
                        is_optional_wrapper: false,
                        map_codecs: Some(MapCodecs {
                            key_sample: sample_scalar_expr(&key.rust_type, key.is_enum, key.is_message),
                            value_sample: sample_scalar_expr(&value.rust_type, value.is_enum, value.is_message),
                            key_codec: key.codec_mod,
                            value_codec: value.codec_mod,
                            value_is_message: value.is_message,
                            value_json_mod: json_codec_mod_for(value.is_enum, value_field.r#type()),
                        }),
                    });
                }
                if let Some(resolved) = self.context.resolve_extern_ident(type_name) {
                    if resolved.is_optional_wrapper {
                        let (kind_expr, codec_mod) = wrapper_scalar_kind(&resolved.rust_path);
                        return Ok(ResolvedFieldType {
                            rust_type: resolved.rust_path.clone(),
                            inner_type: resolved.rust_path,
                            kind_expr: kind_expr.to_owned(),
                            codec_mod: codec_mod.to_owned(),
                            is_message: false,
                            is_extern_message: false,
                            is_enum: false,
                            is_map: false,
                            is_optional_wrapper: true,
                            map_codecs: None,
                        });
                    }
                    return Ok(ResolvedFieldType {
                        rust_type: resolved.rust_path.clone(),
                        inner_type: resolved.rust_path,
                        kind_expr: format!("FieldKind::Message({:?})", type_name),
                        codec_mod: "message_field".into(),
                        is_message: true,
                        is_extern_message: true,
                        is_enum: false,
                        is_map: false,
                        is_optional_wrapper: false,
                        map_codecs: None,
                    });
                }
                let rust_type = self.resolve_type_path(type_name);
                Ok(ResolvedFieldType {
                    rust_type: rust_type.clone(),
                    inner_type: rust_type,
                    kind_expr: format!("FieldKind::Message({:?})", type_name),
                    codec_mod: "message_field".into(),
                    is_message: true,
                    is_extern_message: false,
                    is_enum: false,
                    is_map: false,
                    is_optional_wrapper: false,
                    map_codecs: None,
                })
            }
        }
    }

    fn resolve_type_path(&self, fq_type_name: &str) -> String {
        if let Some(resolved) = self.context.resolve_extern_ident(fq_type_name) {
            return resolved.rust_path;
        }
        let (pkg, rest) = self.context.split_package(fq_type_name);
        let flattened = rest.split('.').map(to_upper_camel).collect::<Vec<_>>().join("");
        if pkg == self.package {
            flattened
        } else if pkg.is_empty() {
            format!("crate::{flattened}")
        } else {
            let module = crate::module::Module::from_protobuf_package_name(&pkg);
            format!("crate::{module}::model::{flattened}")
        }
    }

    fn emit_struct(
        &mut self,
        rust_name: &str,
        fields: &[ResolvedField],
        oneofs: &[&OneofDescriptorProto],
    ) -> Result<(), GeneratorError> {
        writeln!(self.model, "#[derive(Clone, Debug, Default)]").unwrap();
        writeln!(self.model, "pub struct {rust_name} {{").unwrap();

        let mut emitted_oneofs = HashSet::new();
        for field in fields {
            match &field.oneof_group {
                Some(group) if emitted_oneofs.insert(group.clone()) => {
                    let oneof_name = to_snake(group);
                    let type_name = oneof_type_name(rust_name, group);
                    writeln!(self.model, "    pub {oneof_name}: {type_name},").unwrap();
                }
                Some(_) => {}
                None => {
                    writeln!(self.model, "    pub {}: {},", field.rust_name, field.rust_type).unwrap();
                }
            }
        }
        writeln!(self.model, "}}\n").unwrap();

        for oneof in oneofs {
            self.emit_oneof(rust_name, oneof, fields)?;
        }

        Ok(())
    }

    fn emit_oneof(
        &mut self,
        rust_name: &str,
        oneof: &OneofDescriptorProto,
        fields: &[ResolvedField],
    ) -> Result<(), GeneratorError> {
        let members: Vec<&ResolvedField> = fields
            .iter()
            .filter(|f| f.oneof_group.as_deref() == Some(oneof.name()))
            .collect();
        if members.is_empty() {
            return Ok(());
        }

        let kind_name = oneof_kind_name(rust_name, oneof.name());
        let value_name = oneof_value_name(rust_name, oneof.name());
        let type_name = oneof_type_name(rust_name, oneof.name());

        writeln!(self.model, "#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]").unwrap();
        writeln!(self.model, "pub enum {kind_name} {{").unwrap();
        writeln!(self.model, "    Unset,").unwrap();
        for member in &members {
            writeln!(self.model, "    {},", to_upper_camel(member.proto.name())).unwrap();
        }
        writeln!(self.model, "}}\n").unwrap();

        writeln!(
            self.model,
            "impl ::pbj::oneof::UnsetDiscriminant for {kind_name} {{\n    const UNSET: Self = {kind_name}::Unset;\n}}\n"
        )
        .unwrap();

        writeln!(self.model, "#[derive(Clone, Debug)]").unwrap();
        writeln!(self.model, "pub enum {value_name} {{").unwrap();
        for member in &members {
            writeln!(
                self.model,
                "    {}({}),",
                to_upper_camel(member.proto.name()),
                member.rust_type
            )
            .unwrap();
        }
        writeln!(self.model, "}}\n").unwrap();

        // Hand-written rather than derived: a oneof member may carry an f32/f64
        // payload, which has no `Eq`/`Hash` impl to derive against, so every
        // variant goes through the same bit-pattern equality/hashing as a plain
        // float field (see field_eq_clause/field_hash_stmt).
        writeln!(self.model, "impl PartialEq for {value_name} {{").unwrap();
        writeln!(self.model, "    fn eq(&self, other: &Self) -> bool {{").unwrap();
        writeln!(self.model, "        match (self, other) {{").unwrap();
        for member in &members {
            let variant = to_upper_camel(member.proto.name());
            let eq_expr = oneof_member_eq_expr(member);
            writeln!(
                self.model,
                "            ({value_name}::{variant}(a), {value_name}::{variant}(b)) => {eq_expr},"
            )
            .unwrap();
        }
        if members.len() > 1 {
            writeln!(self.model, "            _ => false,").unwrap();
        }
        writeln!(self.model, "        }}\n    }}\n}}\n").unwrap();
        writeln!(self.model, "impl Eq for {value_name} {{}}\n").unwrap();

        writeln!(self.model, "impl ::std::hash::Hash for {value_name} {{").unwrap();
        writeln!(
            self.model,
            "    fn hash<H: ::std::hash::Hasher>(&self, state: &mut H) {{"
        )
        .unwrap();
        writeln!(self.model, "        match self {{").unwrap();
        for (idx, member) in members.iter().enumerate() {
            let variant = to_upper_camel(member.proto.name());
            let hash_stmt = oneof_member_hash_stmt(member);
            writeln!(
                self.model,
                "            {value_name}::{variant}(v) => {{ state.write_u8({idx}); {hash_stmt} }}"
            )
            .unwrap();
        }
        writeln!(self.model, "        }}\n    }}\n}}\n").unwrap();

        writeln!(self.model, "pub type {type_name} = ::pbj::oneof::OneOf<{kind_name}, {value_name}>;\n").unwrap();

        Ok(())
    }

    fn emit_schema(
        &mut self,
        fq_name: &FullyQualifiedName,
        rust_name: &str,
        fields: &[ResolvedField],
    ) -> Result<(), GeneratorError> {
        let fields_const = format!("{}_FIELDS", rust_name.to_uppercase());
        let schema_const = format!("{}_SCHEMA", rust_name.to_uppercase());

        writeln!(
            self.schema,
            "static {fields_const}: &[::pbj::schema::FieldDefinition] = &["
        )
        .unwrap();
        for field in fields {
            let oneof_group = match &field.oneof_group {
                Some(group) => format!(
                    "Some(::pbj::oneof::OneofGroupId({:?}))",
                    format!("{}.{}", fq_name.as_ref(), group)
                ),
                None => "None".to_owned(),
            };
            let max_size = match field.max_size {
                Some(n) => format!("Some({n})"),
                None => "None".to_owned(),
            };
            writeln!(self.schema, "    ::pbj::schema::FieldDefinition {{").unwrap();
            writeln!(self.schema, "        number: {},", field.proto.number()).unwrap();
            writeln!(self.schema, "        name: {:?},", field.proto.name()).unwrap();
            writeln!(self.schema, "        json_name: {:?},", field.json_name).unwrap();
            writeln!(self.schema, "        kind: ::pbj::schema::{},", field.kind_expr).unwrap();
            writeln!(
                self.schema,
                "        repeated: {},",
                field.proto.label() == Label::Repeated && !field.is_map
            )
            .unwrap();
            writeln!(self.schema, "        optional_wrapper: {},", field.is_optional_wrapper).unwrap();
            writeln!(self.schema, "        oneof_group: {oneof_group},").unwrap();
            writeln!(self.schema, "        max_size: {max_size},").unwrap();
            writeln!(self.schema, "        packed: {},", field.packed).unwrap();
            writeln!(self.schema, "    }},").unwrap();
        }
        writeln!(self.schema, "];\n").unwrap();

        writeln!(
            self.schema,
            "static {schema_const}: ::pbj::schema::Schema = ::pbj::schema::Schema::new({:?}, &{fields_const});\n",
            rust_name
        )
        .unwrap();

        Ok(())
    }

    fn emit_message_impl(&mut self, rust_name: &str, fields: &[ResolvedField]) -> Result<(), GeneratorError> {
        let schema_const = format!("{}_SCHEMA", rust_name.to_uppercase());

        writeln!(self.codec, "impl ::pbj::message::Message for super::model::{rust_name} {{").unwrap();
        writeln!(self.codec, "    fn schema() -> &'static ::pbj::schema::Schema {{").unwrap();
        writeln!(self.codec, "        &super::schema::{schema_const}").unwrap();
        writeln!(self.codec, "    }}\n").unwrap();

        writeln!(
            self.codec,
            "    fn write_fields<W: ::pbj::buffer::WriteCursor>(&self, out: &mut W) -> Result<(), ::pbj::error::EncodeFail> {{"
        )
        .unwrap();
        let mut emitted_oneofs = HashSet::new();
        for field in fields {
            self.write_field_write(field, rust_name, fields, &mut emitted_oneofs)?;
        }
        writeln!(self.codec, "        Ok(())\n    }}\n").unwrap();

        writeln!(self.codec, "    fn measure_fields(&self) -> u64 {{").unwrap();
        writeln!(self.codec, "        let mut len = 0u64;").unwrap();
        let mut emitted_oneofs = HashSet::new();
        for field in fields {
            self.write_field_measure(field, rust_name, fields, &mut emitted_oneofs)?;
        }
        writeln!(self.codec, "        len\n    }}\n").unwrap();

        writeln!(
            self.codec,
            "    fn merge_field<R: ::pbj::buffer::ReadCursor>(&mut self, number: u32, wire_type: ::pbj::encoding::WireType, input: &mut R, ctx: ::pbj::encoding::DecodeContext) -> Result<(), ::pbj::error::ParseFail> {{"
        )
        .unwrap();
        writeln!(self.codec, "        match number {{").unwrap();
        for field in fields {
            self.write_field_merge(field, rust_name)?;
        }
        writeln!(self.codec, "            _ => unreachable!(\"looked up against schema first\"),").unwrap();
        writeln!(self.codec, "        }}\n    }}").unwrap();
        writeln!(self.codec, "}}\n").unwrap();

        Ok(())
    }

    fn write_field_write(
        &mut self,
        field: &ResolvedField,
        rust_name: &str,
        fields: &[ResolvedField],
        emitted_oneofs: &mut HashSet<String>,
    ) -> Result<(), GeneratorError> {
        let tag = field.proto.number();
        if let Some(group) = &field.oneof_group {
            if !emitted_oneofs.insert(group.clone()) {
                return Ok(());
            }
            let oneof_name = to_snake(group);
            let value_name = oneof_value_name(rust_name, group);
            writeln!(self.codec, "        match self.{oneof_name}.value() {{").unwrap();
            writeln!(self.codec, "            None => {{}}").unwrap();
            for member in fields.iter().filter(|f| f.oneof_group.as_deref() == Some(group.as_str())) {
                let variant = to_upper_camel(member.proto.name());
                let member_tag = member.proto.number();
                let member_codec = &member.codec_mod;
                writeln!(
                    self.codec,
                    "            Some({value_name}::{variant}(v)) => ::pbj::codec::protobuf::{member_codec}::encode({member_tag}, v, out)?,"
                )
                .unwrap();
            }
            writeln!(self.codec, "        }}").unwrap();
            return Ok(());
        }

        let name = &field.rust_name;
        let codec = &field.codec_mod;
        if field.is_map {
            let MapCodecs { key_codec, value_codec, .. } = field.map_codecs.as_ref().expect("map field has map_codecs");
            writeln!(
                self.codec,
                "        ::pbj::codec::protobuf::{codec}::encode({tag}, ::pbj::codec::protobuf::{key_codec}::encode, ::pbj::codec::protobuf::{key_codec}::encoded_len, ::pbj::codec::protobuf::{value_codec}::encode, ::pbj::codec::protobuf::{value_codec}::encoded_len, &self.{name}, out)?;"
            )
            .unwrap();
        } else if field.proto.label() == Label::Repeated {
            let func = if field.packed { "encode_packed" } else { "encode_repeated" };
            writeln!(
                self.codec,
                "        ::pbj::codec::protobuf::{codec}::{func}({tag}, &self.{name}, out)?;"
            )
            .unwrap();
        } else if field.proto3_optional || field.is_optional_wrapper {
            writeln!(
                self.codec,
                "        if let Some(v) = &self.{name} {{ ::pbj::codec::protobuf::{codec}::encode({tag}, v, out)?; }}"
            )
            .unwrap();
        } else if field.is_message {
            writeln!(
                self.codec,
                "        ::pbj::codec::protobuf::{codec}::encode({tag}, &self.{name}, out)?;"
            )
            .unwrap();
        } else {
            let not_default = non_default_check(field, name);
            writeln!(
                self.codec,
                "        if {not_default} {{ ::pbj::codec::protobuf::{codec}::encode({tag}, &self.{name}, out)?; }}"
            )
            .unwrap();
        }
        Ok(())
    }

    fn write_field_measure(
        &mut self,
        field: &ResolvedField,
        rust_name: &str,
        fields: &[ResolvedField],
        emitted_oneofs: &mut HashSet<String>,
    ) -> Result<(), GeneratorError> {
        let tag = field.proto.number();
        if let Some(group) = &field.oneof_group {
            if !emitted_oneofs.insert(group.clone()) {
                return Ok(());
            }
            let oneof_name = to_snake(group);
            let value_name = oneof_value_name(rust_name, group);
            writeln!(self.codec, "        match self.{oneof_name}.value() {{").unwrap();
            writeln!(self.codec, "            None => {{}}").unwrap();
            for member in fields.iter().filter(|f| f.oneof_group.as_deref() == Some(group.as_str())) {
                let variant = to_upper_camel(member.proto.name());
                let member_tag = member.proto.number();
                let member_codec = &member.codec_mod;
                writeln!(
                    self.codec,
                    "            Some({value_name}::{variant}(v)) => len += ::pbj::codec::protobuf::{member_codec}::encoded_len({member_tag}, v),"
                )
                .unwrap();
            }
            writeln!(self.codec, "        }}").unwrap();
            return Ok(());
        }

        let name = &field.rust_name;
        let codec = &field.codec_mod;
        if field.is_map {
            let MapCodecs { key_codec, value_codec, .. } = field.map_codecs.as_ref().expect("map field has map_codecs");
            writeln!(
                self.codec,
                "        len += ::pbj::codec::protobuf::{codec}::encoded_len({tag}, ::pbj::codec::protobuf::{key_codec}::encoded_len, ::pbj::codec::protobuf::{value_codec}::encoded_len, &self.{name});"
            )
            .unwrap();
        } else if field.proto.label() == Label::Repeated {
            let func = if field.packed { "encoded_len_packed" } else { "encoded_len_repeated" };
            writeln!(self.codec, "        len += ::pbj::codec::protobuf::{codec}::{func}({tag}, &self.{name});").unwrap();
        } else if field.proto3_optional || field.is_optional_wrapper {
            writeln!(
                self.codec,
                "        if let Some(v) = &self.{name} {{ len += ::pbj::codec::protobuf::{codec}::encoded_len({tag}, v); }}"
            )
            .unwrap();
        } else if field.is_message {
            writeln!(self.codec, "        len += ::pbj::codec::protobuf::{codec}::encoded_len({tag}, &self.{name});").unwrap();
        } else {
            let not_default = non_default_check(field, name);
            writeln!(
                self.codec,
                "        if {not_default} {{ len += ::pbj::codec::protobuf::{codec}::encoded_len({tag}, &self.{name}); }}"
            )
            .unwrap();
        }
        Ok(())
    }

    fn write_field_merge(&mut self, field: &ResolvedField, rust_name: &str) -> Result<(), GeneratorError> {
        let tag = field.proto.number();
        let name = &field.rust_name;
        let codec = &field.codec_mod;

        let ctx_expr = match field.max_size {
            Some(n) => format!("ctx.with_max_size({n}u64)"),
            None => "ctx".to_owned(),
        };

        if let Some(group) = &field.oneof_group {
            let oneof_name = to_snake(group);
            let kind_name = oneof_kind_name(rust_name, group);
            let value_name = oneof_value_name(rust_name, group);
            let variant = to_upper_camel(field.proto.name());
            writeln!(self.codec, "            {tag} => {{").unwrap();
            writeln!(self.codec, "                let mut value = Default::default();").unwrap();
            writeln!(
                self.codec,
                "                ::pbj::codec::protobuf::{codec}::merge(wire_type, &mut value, input, {ctx_expr})?;"
            )
            .unwrap();
            writeln!(
                self.codec,
                "                self.{oneof_name} = ::pbj::oneof::OneOf::set({kind_name}::{variant}, {value_name}::{variant}(value));"
            )
            .unwrap();
            writeln!(self.codec, "                Ok(())").unwrap();
            writeln!(self.codec, "            }}").unwrap();
            return Ok(());
        }

        if field.is_map {
            let MapCodecs { key_codec, value_codec, .. } = field.map_codecs.as_ref().expect("map field has map_codecs");
            writeln!(
                self.codec,
                "            {tag} => ::pbj::codec::protobuf::{codec}::merge(::pbj::codec::protobuf::{key_codec}::merge, ::pbj::codec::protobuf::{value_codec}::merge, &mut self.{name}, input, {ctx_expr}),"
            )
            .unwrap();
        } else if field.proto.label() == Label::Repeated {
            writeln!(
                self.codec,
                "            {tag} => ::pbj::codec::protobuf::{codec}::merge_repeated(wire_type, &mut self.{name}, input, {ctx_expr}),"
            )
            .unwrap();
        } else if field.proto3_optional || field.is_optional_wrapper {
            writeln!(self.codec, "            {tag} => {{").unwrap();
            writeln!(self.codec, "                let mut value = Default::default();").unwrap();
            writeln!(
                self.codec,
                "                ::pbj::codec::protobuf::{codec}::merge(wire_type, &mut value, input, {ctx_expr})?;"
            )
            .unwrap();
            writeln!(self.codec, "                self.{name} = Some(value);").unwrap();
            writeln!(self.codec, "                Ok(())").unwrap();
            writeln!(self.codec, "            }}").unwrap();
        } else {
            writeln!(
                self.codec,
                "            {tag} => ::pbj::codec::protobuf::{codec}::merge(wire_type, &mut self.{name}, input, {ctx_expr}),"
            )
            .unwrap();
        }
        Ok(())
    }

    fn emit_json_impl(&mut self, rust_name: &str, fields: &[ResolvedField]) -> Result<(), GeneratorError> {
        let schema_const = format!("{}_SCHEMA", rust_name.to_uppercase());

        writeln!(self.json, "impl ::pbj::codec::json::JsonMessage for super::model::{rust_name} {{").unwrap();
        writeln!(
            self.json,
            "    fn schema_for_json() -> &'static ::pbj::schema::Schema {{ &super::schema::{schema_const} }}\n"
        )
        .unwrap();

        writeln!(
            self.json,
            "    fn write_json_fields(&self, map: &mut ::serde_json::Map<String, ::serde_json::Value>) {{"
        )
        .unwrap();
        let mut emitted_json_write_oneofs = HashSet::new();
        for field in fields {
            if let Some(group) = &field.oneof_group {
                if !emitted_json_write_oneofs.insert(group.clone()) {
                    continue;
                }
                let oneof_name = to_snake(group);
                let value_name = oneof_value_name(rust_name, group);
                writeln!(self.json, "        match self.{oneof_name}.value() {{").unwrap();
                writeln!(self.json, "            None => {{}}").unwrap();
                for member in fields.iter().filter(|f| f.oneof_group.as_deref() == Some(group.as_str())) {
                    let variant = to_upper_camel(member.proto.name());
                    let member_json_name = &member.json_name;
                    let to_json = oneof_member_to_json_expr(member);
                    writeln!(
                        self.json,
                        "            Some({value_name}::{variant}(v)) => {{ map.insert({member_json_name:?}.to_string(), {to_json}); }}"
                    )
                    .unwrap();
                }
                writeln!(self.json, "        }}").unwrap();
                continue;
            }
            let name = &field.rust_name;
            let json_name = &field.json_name;
            if field.is_map {
                let MapCodecs { value_is_message, value_json_mod, .. } =
                    field.map_codecs.as_ref().expect("map field has map_codecs");
                let value_to_json = if *value_is_message {
                    "v.write_json()".to_owned()
                } else {
                    format!("::pbj::codec::json::{value_json_mod}::to_value(v)")
                };
                writeln!(
                    self.json,
                    "        if !self.{name}.is_empty() {{ map.insert({json_name:?}.to_string(), ::serde_json::Value::Object(self.{name}.iter().map(|(k, v)| (k.to_string(), {value_to_json})).collect())); }}"
                )
                .unwrap();
                continue;
            }
            if field.is_message {
                let to_value = "|v| ::serde_json::to_value(v.write_json()).unwrap_or(::serde_json::Value::Null)";
                if field.proto.label() == Label::Repeated {
                    writeln!(
                        self.json,
                        "        if !self.{name}.is_empty() {{ map.insert({json_name:?}.to_string(), ::serde_json::Value::Array(self.{name}.iter().map({to_value}).collect())); }}"
                    )
                    .unwrap();
                } else if field.proto3_optional {
                    writeln!(
                        self.json,
                        "        if let Some(v) = &self.{name} {{ map.insert({json_name:?}.to_string(), v.write_json()); }}"
                    )
                    .unwrap();
                } else {
                    writeln!(
                        self.json,
                        "        map.insert({json_name:?}.to_string(), self.{name}.write_json());"
                    )
                    .unwrap();
                }
                continue;
            }
            let json_mod = json_codec_mod(field);
            if field.proto.label() == Label::Repeated {
                writeln!(
                    self.json,
                    "        if !self.{name}.is_empty() {{ map.insert({json_name:?}.to_string(), ::serde_json::Value::Array(self.{name}.iter().map(|v| ::pbj::codec::json::{json_mod}::to_value(v)).collect())); }}"
                )
                .unwrap();
            } else if field.proto3_optional || field.is_optional_wrapper {
                writeln!(
                    self.json,
                    "        if let Some(v) = &self.{name} {{ map.insert({json_name:?}.to_string(), ::pbj::codec::json::{json_mod}::to_value(v)); }}"
                )
                .unwrap();
            } else {
                let not_default = non_default_check(field, name);
                writeln!(
                    self.json,
                    "        if {not_default} {{ map.insert({json_name:?}.to_string(), ::pbj::codec::json::{json_mod}::to_value(&self.{name})); }}"
                )
                .unwrap();
            }
        }
        writeln!(self.json, "    }}\n").unwrap();

        writeln!(
            self.json,
            "    fn merge_json_field(&mut self, json_name: &str, value: &::serde_json::Value, ctx: ::pbj::encoding::DecodeContext) -> Result<(), ::pbj::error::ParseFail> {{"
        )
        .unwrap();
        writeln!(self.json, "        match json_name {{").unwrap();
        let mut emitted_json_merge_oneofs = HashSet::new();
        for field in fields {
            if let Some(group) = &field.oneof_group {
                if !emitted_json_merge_oneofs.insert(group.clone()) {
                    continue;
                }
                let oneof_name = to_snake(group);
                let kind_name = oneof_kind_name(rust_name, group);
                let value_name = oneof_value_name(rust_name, group);
                for member in fields.iter().filter(|f| f.oneof_group.as_deref() == Some(group.as_str())) {
                    let variant = to_upper_camel(member.proto.name());
                    let member_json_name = &member.json_name;
                    let from_json = oneof_member_from_json_expr(member);
                    writeln!(self.json, "            {member_json_name:?} => {{").unwrap();
                    writeln!(self.json, "                let v = {from_json};").unwrap();
                    writeln!(
                        self.json,
                        "                self.{oneof_name} = ::pbj::oneof::OneOf::set({kind_name}::{variant}, {value_name}::{variant}(v));"
                    )
                    .unwrap();
                    writeln!(self.json, "                Ok(())").unwrap();
                    writeln!(self.json, "            }}").unwrap();
                }
                continue;
            }
            let name = &field.rust_name;
            let json_name = &field.json_name;
            if field.is_map {
                let MapCodecs { value_is_message, value_json_mod, .. } =
                    field.map_codecs.as_ref().expect("map field has map_codecs");
                let value_from_json = if *value_is_message {
                    "::pbj::codec::json::JsonMessage::parse_json_bounded(v, false, ::pbj::message::DEFAULT_MAX_DEPTH, ctx.max_size())?".to_owned()
                } else {
                    format!("::pbj::codec::json::{value_json_mod}::from_value(v)?")
                };
                writeln!(self.json, "            {json_name:?} => {{").unwrap();
                writeln!(self.json, "                if let ::serde_json::Value::Object(obj) = value {{").unwrap();
                writeln!(self.json, "                    for (k, v) in obj {{").unwrap();
                writeln!(
                    self.json,
                    "                        let key = k.parse().map_err(|_| ::pbj::error::ParseFail::from(::pbj::error::parse_fail_kind::Malformed::new(\"invalid map key\".to_string())))?;"
                )
                .unwrap();
                writeln!(self.json, "                        let value = {value_from_json};").unwrap();
                writeln!(self.json, "                        self.{name}.insert(key, value);").unwrap();
                writeln!(self.json, "                    }}").unwrap();
                writeln!(self.json, "                }}").unwrap();
                writeln!(self.json, "                Ok(())").unwrap();
                writeln!(self.json, "            }}").unwrap();
                continue;
            }
            if field.is_message {
                if field.proto3_optional {
                    writeln!(
                        self.json,
                        "            {json_name:?} => {{ self.{name} = Some(::pbj::codec::json::JsonMessage::parse_json_bounded(value, false, ::pbj::message::DEFAULT_MAX_DEPTH, ctx.max_size())?); Ok(()) }}"
                    )
                    .unwrap();
                } else {
                    writeln!(
                        self.json,
                        "            {json_name:?} => {{ self.{name} = ::pbj::codec::json::JsonMessage::parse_json_bounded(value, false, ::pbj::message::DEFAULT_MAX_DEPTH, ctx.max_size())?; Ok(()) }}"
                    )
                    .unwrap();
                }
                continue;
            }
            let json_mod = json_codec_mod(field);
            let is_bytes = matches!(field.proto.r#type(), Type::Bytes) || field.codec_mod == "bytes_field";
            let from_value = if is_bytes {
                "::pbj::codec::json::bytes_json::from_value(value, ctx)?".to_owned()
            } else {
                format!("::pbj::codec::json::{json_mod}::from_value(value)?")
            };
            if field.proto3_optional || field.is_optional_wrapper {
                writeln!(
                    self.json,
                    "            {json_name:?} => {{ self.{name} = Some({from_value}); Ok(()) }}"
                )
                .unwrap();
            } else {
                writeln!(
                    self.json,
                    "            {json_name:?} => {{ self.{name} = {from_value}; Ok(()) }}"
                )
                .unwrap();
            }
        }
        writeln!(self.json, "            _ => Ok(()),").unwrap();
        writeln!(self.json, "        }}\n    }}").unwrap();
        writeln!(self.json, "}}\n").unwrap();

        Ok(())
    }

    fn emit_equality_impls(
        &mut self,
        fq_name: &FullyQualifiedName,
        rust_name: &str,
        message: &DescriptorProto,
        fields: &[ResolvedField],
    ) -> Result<(), GeneratorError> {
        writeln!(self.model, "impl PartialEq for {rust_name} {{").unwrap();
        writeln!(self.model, "    fn eq(&self, other: &Self) -> bool {{").unwrap();
        let mut emitted_oneofs = HashSet::new();
        let mut clauses = Vec::new();
        for field in fields {
            match &field.oneof_group {
                Some(group) if emitted_oneofs.insert(group.clone()) => {
                    let name = to_snake(group);
                    clauses.push(format!("self.{name} == other.{name}"));
                }
                Some(_) => {}
                None => clauses.push(field_eq_clause(field)),
            }
        }
        if clauses.is_empty() {
            writeln!(self.model, "        true").unwrap();
        } else {
            writeln!(self.model, "        {}", clauses.join(" && ")).unwrap();
        }
        writeln!(self.model, "    }}\n}}\n").unwrap();
        writeln!(self.model, "impl Eq for {rust_name} {{}}\n").unwrap();

        writeln!(self.model, "impl ::std::hash::Hash for {rust_name} {{").unwrap();
        writeln!(self.model, "    fn hash<H: ::std::hash::Hasher>(&self, state: &mut H) {{").unwrap();
        writeln!(self.model, "        let mut acc = ::pbj::equality::HASH_SEED;").unwrap();
        let mut emitted_oneofs = HashSet::new();
        for field in fields {
            match &field.oneof_group {
                Some(group) if emitted_oneofs.insert(group.clone()) => {
                    let name = to_snake(group);
                    writeln!(
                        self.model,
                        "        acc = ::pbj::equality::combine_field_hash(acc, ::pbj::equality::hash_one(&self.{name}));"
                    )
                    .unwrap();
                }
                Some(_) => {}
                None => {
                    writeln!(self.model, "        {}", field_hash_stmt(field)).unwrap();
                }
            }
        }
        writeln!(self.model, "        state.write_u64(acc);\n    }}\n}}\n").unwrap();

        let message_path = fq_name.as_ref();
        let strict = self.context.config().strict_options;
        let uninterpreted = message
            .options
            .as_ref()
            .map(|o| o.uninterpreted_option.as_slice())
            .unwrap_or(&[]);
        let comparable_fields = options::message_comparable_fields(uninterpreted, strict, message_path)?;
        if let Some(names) = comparable_fields {
            for name in &names {
                if !fields
                    .iter()
                    .any(|f| f.proto.name() == name && f.proto.label() != Label::Repeated && f.oneof_group.is_none())
                {
                    return Err(NonComparableField::new(
                        message_path.to_owned(),
                        name.clone(),
                        "field is repeated, absent, or part of a oneof".to_owned(),
                    ));
                }
            }
            writeln!(self.model, "impl PartialOrd for {rust_name} {{").unwrap();
            writeln!(self.model, "    fn partial_cmp(&self, other: &Self) -> Option<::std::cmp::Ordering> {{ Some(self.cmp(other)) }}\n}}\n").unwrap();
            writeln!(self.model, "impl Ord for {rust_name} {{").unwrap();
            writeln!(self.model, "    fn cmp(&self, other: &Self) -> ::std::cmp::Ordering {{").unwrap();
            writeln!(self.model, "        ::std::cmp::Ordering::Equal").unwrap();
            for name in &names {
                let field = fields.iter().find(|f| f.proto.name() == name).unwrap();
                writeln!(self.model, "            .then_with(|| {})", field_cmp_expr(field)).unwrap();
            }
            writeln!(self.model, "    }}\n}}\n").unwrap();
        }

        Ok(())
    }

    /// Emits a `{rust_name}Builder` alongside `{rust_name}` itself: a plain
    /// wrapper around the message that exposes one setter per field (plus
    /// per-member setters for oneofs), returning `Self` for chaining, and a
    /// `build()` that unwraps to the finished message.
    fn emit_builder(&mut self, rust_name: &str, fields: &[ResolvedField]) -> Result<(), GeneratorError> {
        let builder_name = format!("{rust_name}Builder");

        writeln!(self.model, "impl {rust_name} {{").unwrap();
        writeln!(self.model, "    pub fn new_builder() -> {builder_name} {{ {builder_name}::default() }}").unwrap();
        writeln!(
            self.model,
            "    pub fn copy_builder(&self) -> {builder_name} {{ {builder_name} {{ inner: self.clone() }} }}"
        )
        .unwrap();
        writeln!(self.model, "}}\n").unwrap();

        writeln!(self.model, "#[derive(Clone, Debug, Default)]").unwrap();
        writeln!(self.model, "pub struct {builder_name} {{ inner: {rust_name} }}\n").unwrap();

        writeln!(self.model, "impl {builder_name} {{").unwrap();
        writeln!(self.model, "    pub fn build(self) -> {rust_name} {{ self.inner }}").unwrap();

        let mut emitted_oneofs = HashSet::new();
        for field in fields {
            if let Some(group) = &field.oneof_group {
                if !emitted_oneofs.insert(group.clone()) {
                    continue;
                }
                let oneof_name = to_snake(group);
                let kind_name = oneof_kind_name(rust_name, group);
                let value_name = oneof_value_name(rust_name, group);
                for member in fields.iter().filter(|f| f.oneof_group.as_deref() == Some(group.as_str())) {
                    let variant = to_upper_camel(member.proto.name());
                    let setter = format!("{oneof_name}_{}", member.rust_name);
                    let (param_type, value_expr) = if member.is_message && !member.is_extern_message {
                        (format!("{}Builder", member.inner_type), "value.build()".to_owned())
                    } else if member.is_optional_wrapper {
                        (member.inner_type.clone(), "Some(value)".to_owned())
                    } else {
                        (member.inner_type.clone(), "value".to_owned())
                    };
                    writeln!(
                        self.model,
                        "    pub fn {setter}(mut self, value: {param_type}) -> Self {{ self.inner.{oneof_name} = ::pbj::oneof::OneOf::set({kind_name}::{variant}, {value_name}::{variant}({value_expr})); self }}"
                    )
                    .unwrap();
                }
                continue;
            }

            let name = &field.rust_name;
            if field.is_map {
                writeln!(
                    self.model,
                    "    pub fn {name}(mut self, value: {}) -> Self {{ self.inner.{name} = value; self }}",
                    field.rust_type
                )
                .unwrap();
            } else if field.proto.label() == Label::Repeated {
                writeln!(
                    self.model,
                    "    pub fn {name}(mut self, values: impl IntoIterator<Item = {}>) -> Self {{ self.inner.{name}.extend(values); self }}",
                    field.inner_type
                )
                .unwrap();
            } else if field.proto3_optional || field.is_optional_wrapper {
                if field.is_message && !field.is_extern_message {
                    writeln!(
                        self.model,
                        "    pub fn {name}(mut self, value: {}Builder) -> Self {{ self.inner.{name} = Some(value.build()); self }}",
                        field.inner_type
                    )
                    .unwrap();
                } else {
                    writeln!(
                        self.model,
                        "    pub fn {name}(mut self, value: {}) -> Self {{ self.inner.{name} = Some(value); self }}",
                        field.inner_type
                    )
                    .unwrap();
                }
            } else if field.is_message && !field.is_extern_message {
                writeln!(
                    self.model,
                    "    pub fn {name}(mut self, value: {}Builder) -> Self {{ self.inner.{name} = value.build(); self }}",
                    field.inner_type
                )
                .unwrap();
            } else {
                writeln!(
                    self.model,
                    "    pub fn {name}(mut self, value: {}) -> Self {{ self.inner.{name} = value; self }}",
                    field.rust_type
                )
                .unwrap();
            }
        }
        writeln!(self.model, "}}\n").unwrap();
        Ok(())
    }

    /// Emits a `samples_{rust_name}` factory covering, per SPEC_FULL.md's
    /// round-trip corpus: the all-defaults message, one message with every
    /// scalar/message/map field set to a representative non-default value,
    /// one-element and many-element variants of every repeated field, every
    /// oneof member (the all-defaults sample already covers "unset"), and a
    /// `Some(zero)` variant of every optional-wrapper field.
    fn emit_test_factory(&mut self, rust_name: &str, fields: &[ResolvedField]) {
        writeln!(self.test_factory, "pub fn samples_{rust_name}() -> Vec<{rust_name}> {{").unwrap();
        writeln!(self.test_factory, "    let mut samples = vec![{rust_name}::default()];").unwrap();

        let non_oneof: Vec<&ResolvedField> = fields.iter().filter(|f| f.oneof_group.is_none()).collect();
        if !non_oneof.is_empty() {
            let assignments: Vec<String> = non_oneof
                .iter()
                .map(|field| {
                    let name = &field.rust_name;
                    if field.is_map {
                        let codecs = field.map_codecs.as_ref().expect("map field has map_codecs");
                        format!(
                            "{name}: [({}, {})].into_iter().collect()",
                            codecs.key_sample, codecs.value_sample
                        )
                    } else if field.proto.label() == Label::Repeated {
                        let value = sample_scalar_expr(&field.inner_type, field.is_enum, field.is_message);
                        format!("{name}: vec![{value}, {value}]")
                    } else if field.proto3_optional || field.is_optional_wrapper {
                        let value = sample_scalar_expr(&field.inner_type, field.is_enum, field.is_message);
                        format!("{name}: Some({value})")
                    } else {
                        let value = sample_scalar_expr(&field.inner_type, field.is_enum, field.is_message);
                        format!("{name}: {value}")
                    }
                })
                .collect();
            writeln!(
                self.test_factory,
                "    samples.push({rust_name} {{ {}, ..{rust_name}::default() }});",
                assignments.join(", ")
            )
            .unwrap();
        }

        for field in &non_oneof {
            let name = &field.rust_name;
            if field.is_map {
                continue;
            }
            if field.proto.label() == Label::Repeated {
                let value = sample_scalar_expr(&field.inner_type, field.is_enum, field.is_message);
                writeln!(
                    self.test_factory,
                    "    samples.push({rust_name} {{ {name}: vec![{value}], ..{rust_name}::default() }});"
                )
                .unwrap();
            } else if field.is_optional_wrapper {
                let zero = zero_scalar_expr(&field.inner_type);
                writeln!(
                    self.test_factory,
                    "    samples.push({rust_name} {{ {name}: Some({zero}), ..{rust_name}::default() }});"
                )
                .unwrap();
            }
        }

        let mut emitted_oneofs = HashSet::new();
        for field in fields {
            if let Some(group) = &field.oneof_group {
                if !emitted_oneofs.insert(group.clone()) {
                    continue;
                }
                let oneof_name = to_snake(group);
                let kind_name = oneof_kind_name(rust_name, group);
                let value_name = oneof_value_name(rust_name, group);
                for member in fields.iter().filter(|f| f.oneof_group.as_deref() == Some(group.as_str())) {
                    let variant = to_upper_camel(member.proto.name());
                    let value = sample_scalar_expr(&member.inner_type, member.is_enum, member.is_message);
                    let payload = if member.is_optional_wrapper { format!("Some({value})") } else { value };
                    writeln!(
                        self.test_factory,
                        "    samples.push({rust_name} {{ {oneof_name}: ::pbj::oneof::OneOf::set({kind_name}::{variant}, {value_name}::{variant}({payload})), ..{rust_name}::default() }});"
                    )
                    .unwrap();
                }
            }
        }

        writeln!(self.test_factory, "    samples\n}}\n").unwrap();
    }

    fn push_enum(
        &mut self,
        package_fqn: &FullyQualifiedName,
        type_path: &[String],
        proto_enum: &EnumDescriptorProto,
    ) -> Result<(), GeneratorError> {
        let _ = package_fqn;
        let name = proto_enum.name();
        let rust_name = flattened_name(type_path, name);

        let values: Vec<&EnumValueDescriptorProto> = proto_enum.value.iter().collect();
        let prefix = common_prefix(&values);
        let strip = self.context.config().strip_enum_prefix;

        writeln!(self.model, "#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]").unwrap();
        writeln!(self.model, "pub enum {rust_name} {{").unwrap();
        for value in &values {
            let variant = if strip {
                strip_enum_prefix(&prefix, &to_upper_camel(value.name()))
            } else {
                to_upper_camel(value.name())
            };
            writeln!(self.model, "    {variant} = {},", value.number()).unwrap();
        }
        writeln!(self.model, "}}\n").unwrap();

        writeln!(self.model, "impl ::pbj::schema::EnumValue for {rust_name} {{").unwrap();
        writeln!(self.model, "    fn ordinal(&self) -> i32 {{ *self as i32 }}\n").unwrap();
        writeln!(self.model, "    fn name(&self) -> &'static str {{").unwrap();
        writeln!(self.model, "        match self {{").unwrap();
        for value in &values {
            let variant = if strip {
                strip_enum_prefix(&prefix, &to_upper_camel(value.name()))
            } else {
                to_upper_camel(value.name())
            };
            writeln!(self.model, "            {rust_name}::{variant} => {:?},", value.name()).unwrap();
        }
        writeln!(self.model, "        }}\n    }}\n").unwrap();

        writeln!(self.model, "    fn from_ordinal(ordinal: i32) -> Option<Self> {{").unwrap();
        writeln!(self.model, "        match ordinal {{").unwrap();
        for value in &values {
            let variant = if strip {
                strip_enum_prefix(&prefix, &to_upper_camel(value.name()))
            } else {
                to_upper_camel(value.name())
            };
            writeln!(self.model, "            {} => Some({rust_name}::{variant}),", value.number()).unwrap();
        }
        writeln!(self.model, "            _ => None,\n        }}\n    }}\n").unwrap();

        writeln!(self.model, "    fn from_name(name: &str) -> Option<Self> {{").unwrap();
        writeln!(self.model, "        match name {{").unwrap();
        for value in &values {
            let variant = if strip {
                strip_enum_prefix(&prefix, &to_upper_camel(value.name()))
            } else {
                to_upper_camel(value.name())
            };
            writeln!(self.model, "            {:?} => Some({rust_name}::{variant}),", value.name()).unwrap();
        }
        writeln!(self.model, "            _ => None,\n        }}\n    }}\n}}\n").unwrap();

        Ok(())
    }
}

/// Proto3 singular scalar fields are only written when they differ from
/// their type's zero value (§4.2); this renders that check for the type
/// actually carried by `field`, matching the hand-written `Pair` codec's
/// `self.id != 0` / `!self.name.is_empty()` style.
fn non_default_check(field: &ResolvedField, name: &str) -> String {
    use Type::*;
    if field.is_enum {
        return format!("self.{name}.ordinal() != 0");
    }
    match field.proto.r#type() {
        String | Bytes => format!("!self.{name}.is_empty()"),
        Bool => format!("self.{name}"),
        Float => format!("self.{name} != 0.0f32"),
        Double => format!("self.{name} != 0.0f64"),
        _ => format!("self.{name} != 0"),
    }
}

/// Maps a `google.protobuf.*Value` wrapper's bare scalar Rust type (as
/// resolved by `ExternPaths`) to the `FieldKind` variant and codec module for
/// the payload it carries, so a wrapper field dispatches through the plain
/// scalar codec rather than `message_field`.
fn wrapper_scalar_kind(rust_type: &str) -> (&'static str, &'static str) {
    match rust_type {
        "bool" => ("FieldKind::Bool", "bool_field"),
        "f64" => ("FieldKind::Double", "double"),
        "f32" => ("FieldKind::Float", "float"),
        "i32" => ("FieldKind::Int32", "int32"),
        "i64" => ("FieldKind::Int64", "int64"),
        "u32" => ("FieldKind::UInt32", "uint32"),
        "u64" => ("FieldKind::UInt64", "uint64"),
        "::std::string::String" => ("FieldKind::String", "string_field"),
        "::std::vec::Vec<u8>" => ("FieldKind::Bytes", "bytes_field"),
        other => unreachable!("unexpected wrapper scalar type: {other}"),
    }
}

/// A representative non-default value expression for a resolved scalar,
/// enum, or message Rust type, for use in `emit_test_factory`'s corpus.
/// Dispatches on `rust_type` rather than the descriptor's `Type` so it works
/// uniformly for wrapper-field payloads too, whose descriptor type is always
/// `Message`.
fn sample_scalar_expr(rust_type: &str, is_enum: bool, is_message: bool) -> String {
    if is_message {
        return format!("{rust_type}::default()");
    }
    if is_enum {
        return format!("<{rust_type} as ::pbj::schema::EnumValue>::from_ordinal(0).expect(\"zero ordinal always present\")");
    }
    match rust_type {
        "bool" => "true".to_owned(),
        "f32" => "1.5f32".to_owned(),
        "f64" => "1.5f64".to_owned(),
        "::std::string::String" => "\"sample\".to_owned()".to_owned(),
        "::std::vec::Vec<u8>" => "vec![1u8, 2u8]".to_owned(),
        "i32" => "7i32".to_owned(),
        "i64" => "7i64".to_owned(),
        "u32" => "7u32".to_owned(),
        "u64" => "7u64".to_owned(),
        _ => "Default::default()".to_owned(),
    }
}

/// The zero value for a scalar Rust type, for the `Some(zero)`
/// optional-wrapper corpus case (distinct from `sample_scalar_expr`'s
/// deliberately non-default value).
fn zero_scalar_expr(rust_type: &str) -> String {
    match rust_type {
        "bool" => "false".to_owned(),
        "f32" => "0.0f32".to_owned(),
        "f64" => "0.0f64".to_owned(),
        "::std::string::String" => "::std::string::String::new()".to_owned(),
        "::std::vec::Vec<u8>" => "::std::vec::Vec::new()".to_owned(),
        _ => "0".to_owned(),
    }
}

fn is_packable(field: &FieldDescriptorProto) -> bool {
    use Type::*;
    !matches!(field.r#type(), String | Bytes | Message | Group)
}

fn wrap_type(base: &str, repeated: bool, is_map: bool, proto3_optional: bool, is_optional_wrapper: bool) -> String {
    if is_map {
        base.to_owned()
    } else if repeated {
        format!("::std::vec::Vec<{base}>")
    } else if proto3_optional || is_optional_wrapper {
        format!("::std::option::Option<{base}>")
    } else {
        base.to_owned()
    }
}

fn flattened_name(type_path: &[String], name: &str) -> String {
    let mut parts: Vec<String> = type_path.iter().map(|s| to_upper_camel(s)).collect();
    parts.push(to_upper_camel(name));
    parts.join("")
}

fn oneof_kind_name(message: &str, oneof: &str) -> String {
    format!("{message}{}Kind", to_upper_camel(oneof))
}

fn oneof_value_name(message: &str, oneof: &str) -> String {
    format!("{message}{}Value", to_upper_camel(oneof))
}

fn oneof_type_name(message: &str, oneof: &str) -> String {
    format!("{message}{}", to_upper_camel(oneof))
}

fn json_codec_mod(field: &ResolvedField) -> &'static str {
    // A `google.protobuf.*Value` wrapper field's descriptor type is always
    // `Message` (it names the wrapper message), so its JSON module has to be
    // derived from the scalar codec it was resolved to, not from the raw
    // descriptor type.
    if field.is_optional_wrapper {
        return json_mod_for_wrapper_codec(&field.codec_mod);
    }
    json_codec_mod_for(field.is_enum, field.proto.r#type())
}

fn json_mod_for_wrapper_codec(codec_mod: &str) -> &'static str {
    match codec_mod {
        "bool_field" => "bool_json",
        "double" => "f64_json",
        "float" => "f32_json",
        "int32" => "i32_json",
        "int64" => "i64_json",
        "uint32" => "u32_json",
        "uint64" => "u64_json",
        "string_field" => "string_json",
        "bytes_field" => "bytes_json",
        other => unreachable!("unexpected wrapper codec module: {other}"),
    }
}

fn json_codec_mod_for(is_enum: bool, ty: Type) -> &'static str {
    if is_enum {
        return "enum_json";
    }
    use Type::*;
    match ty {
        Int32 | Sint32 | Sfixed32 => "i32_json",
        Int64 | Sint64 | Sfixed64 => "i64_json",
        Uint32 | Fixed32 => "u32_json",
        Uint64 | Fixed64 => "u64_json",
        Float => "f32_json",
        Double => "f64_json",
        Bool => "bool_json",
        String => "string_json",
        Bytes => "bytes_json",
        Message | Group => "message_json",
    }
}

fn oneof_member_eq_expr(member: &ResolvedField) -> String {
    match member.proto.r#type() {
        Type::Float => "::pbj::equality::eq_f32(*a, *b)".to_owned(),
        Type::Double => "::pbj::equality::eq_f64(*a, *b)".to_owned(),
        _ => "a == b".to_owned(),
    }
}

fn oneof_member_hash_stmt(member: &ResolvedField) -> String {
    match member.proto.r#type() {
        Type::Float => "state.write_u64(::pbj::equality::hash_f32(*v));".to_owned(),
        Type::Double => "state.write_u64(::pbj::equality::hash_f64(*v));".to_owned(),
        _ => "state.write_u64(::pbj::equality::hash_one(v));".to_owned(),
    }
}

/// JSON serialization for one oneof member, given a bound `v: &{member type}`.
fn oneof_member_to_json_expr(member: &ResolvedField) -> String {
    if member.is_message {
        return "v.write_json()".to_owned();
    }
    let json_mod = json_codec_mod(member);
    if member.is_optional_wrapper {
        format!(
            "match v {{ Some(inner) => ::pbj::codec::json::{json_mod}::to_value(inner), None => ::serde_json::Value::Null }}"
        )
    } else {
        format!("::pbj::codec::json::{json_mod}::to_value(v)")
    }
}

/// JSON parsing for one oneof member, given a bound `value: &::serde_json::Value`.
fn oneof_member_from_json_expr(member: &ResolvedField) -> String {
    if member.is_message {
        return "::pbj::codec::json::JsonMessage::parse_json_bounded(value, false, ::pbj::message::DEFAULT_MAX_DEPTH, ctx.max_size())?".to_owned();
    }
    let json_mod = json_codec_mod(member);
    let is_bytes = matches!(member.proto.r#type(), Type::Bytes) || member.codec_mod == "bytes_field";
    let scalar = if is_bytes {
        "::pbj::codec::json::bytes_json::from_value(value, ctx)?".to_owned()
    } else {
        format!("::pbj::codec::json::{json_mod}::from_value(value)?")
    };
    if member.is_optional_wrapper {
        format!("Some({scalar})")
    } else {
        scalar
    }
}

fn field_eq_clause(field: &ResolvedField) -> String {
    let name = &field.rust_name;
    match (field.proto.r#type(), field.proto3_optional) {
        (Type::Float, false) => format!("::pbj::equality::eq_f32(self.{name}, other.{name})"),
        (Type::Double, false) => format!("::pbj::equality::eq_f64(self.{name}, other.{name})"),
        (Type::Float, true) => {
            format!("self.{name}.map(f32::to_bits) == other.{name}.map(f32::to_bits)")
        }
        (Type::Double, true) => {
            format!("self.{name}.map(f64::to_bits) == other.{name}.map(f64::to_bits)")
        }
        _ => format!("self.{name} == other.{name}"),
    }
}

fn field_hash_stmt(field: &ResolvedField) -> String {
    let name = &field.rust_name;
    match (field.proto.r#type(), field.proto3_optional) {
        (Type::Float, false) => format!(
            "acc = ::pbj::equality::combine_field_hash(acc, ::pbj::equality::hash_f32(self.{name}));"
        ),
        (Type::Double, false) => format!(
            "acc = ::pbj::equality::combine_field_hash(acc, ::pbj::equality::hash_f64(self.{name}));"
        ),
        (Type::Float, true) => format!(
            "acc = ::pbj::equality::combine_field_hash(acc, ::pbj::equality::hash_one(&self.{name}.map(f32::to_bits)));"
        ),
        (Type::Double, true) => format!(
            "acc = ::pbj::equality::combine_field_hash(acc, ::pbj::equality::hash_one(&self.{name}.map(f64::to_bits)));"
        ),
        _ => format!(
            "acc = ::pbj::equality::combine_field_hash(acc, ::pbj::equality::hash_one(&self.{name}));"
        ),
    }
}

fn field_cmp_expr(field: &ResolvedField) -> String {
    let name = &field.rust_name;
    match (field.proto.r#type(), field.proto3_optional) {
        (Type::Float, false) => format!("::pbj::equality::cmp_f32(self.{name}, other.{name})"),
        (Type::Double, false) => format!("::pbj::equality::cmp_f64(self.{name}, other.{name})"),
        (Type::Float, true) => format!(
            "self.{name}.map(f32::to_bits).cmp(&other.{name}.map(f32::to_bits))"
        ),
        (Type::Double, true) => format!(
            "self.{name}.map(f64::to_bits).cmp(&other.{name}.map(f64::to_bits))"
        ),
        _ => format!("self.{name}.cmp(&other.{name})"),
    }
}

fn common_prefix(values: &[&EnumValueDescriptorProto]) -> String {
    let names: Vec<&str> = values.iter().map(|v| v.name()).collect();
    match names.split_first() {
        None => String::new(),
        Some((first, rest)) => {
            let mut prefix = first.to_string();
            for name in rest {
                while !name.starts_with(&prefix) {
                    prefix.pop();
                    if prefix.is_empty() {
                        return prefix;
                    }
                }
            }
            prefix
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::extern_paths::ExternPaths;
    use crate::message_graph::MessageGraph;

    fn field(name: &str, number: i32, ty: Type, oneof_index: Option<i32>) -> FieldDescriptorProto {
        FieldDescriptorProto {
            name: Some(name.to_owned()),
            number: Some(number),
            label: Some(Label::Optional as i32),
            r#type: Some(ty as i32),
            oneof_index,
            ..Default::default()
        }
    }

    fn wrapper_field(name: &str, number: i32, wrapper: &str) -> FieldDescriptorProto {
        FieldDescriptorProto {
            type_name: Some(format!(".google.protobuf.{wrapper}")),
            ..field(name, number, Type::Message, None)
        }
    }

    /// Builds a single-message `FileDescriptorProto` with:
    /// - a plain scalar field
    /// - a oneof with an int and a float member (exercises the hand-written
    ///   `Eq`/`Hash` impl, since `f32` can't derive either)
    /// - a `google.protobuf.StringValue`-wrapped field
    fn sample_file() -> FileDescriptorProto {
        let message = DescriptorProto {
            name: Some("Envelope".to_owned()),
            field: vec![
                field("id", 1, Type::Int32, None),
                field("int_val", 2, Type::Int32, Some(0)),
                field("float_val", 3, Type::Float, Some(0)),
                wrapper_field("label", 4, "StringValue"),
            ],
            oneof_decl: vec![OneofDescriptorProto {
                name: Some("payload".to_owned()),
                ..Default::default()
            }],
            ..Default::default()
        };
        FileDescriptorProto {
            name: Some("envelope.proto".to_owned()),
            message_type: vec![message],
            ..Default::default()
        }
    }

    fn try_generate(file: FileDescriptorProto) -> Result<(GeneratedModule, String), GeneratorError> {
        let config = Config::new();
        let extern_paths = ExternPaths::new(&[], true).unwrap();
        let message_graph = MessageGraph::new(std::iter::once(&file)).unwrap();
        let known_packages = vec![String::new()];
        let context = Context::new(&config, &message_graph, &extern_paths, &known_packages);
        let mut seen_messages = HashSet::new();
        CodeGenerator::generate(&context, &mut seen_messages, file)
    }

    fn generate(file: FileDescriptorProto) -> (GeneratedModule, String) {
        try_generate(file).unwrap()
    }

    #[test]
    fn oneof_value_enum_hand_writes_eq_and_hash() {
        let (generated, _) = generate(sample_file());
        assert!(generated.model.contains("pub enum EnvelopePayloadValue"));
        assert!(generated.model.contains("impl ::std::hash::Hash for EnvelopePayloadValue"));
        assert!(generated.model.contains("impl Eq for EnvelopePayloadValue"));
        // The float member can't derive Eq/Hash, so it must go through the
        // same bit-pattern helpers used for plain float fields.
        assert!(generated.model.contains("::pbj::equality::eq_f32(*a, *b)"));
        assert!(generated.model.contains("::pbj::equality::hash_f32(*v)"));
    }

    #[test]
    fn wrapper_field_dispatches_through_scalar_codec() {
        let (generated, _) = generate(sample_file());
        assert!(generated.codec.contains("::pbj::codec::protobuf::string_field::encode(4, v, out)"));
        assert!(!generated.codec.contains("message_field::encode(4"));
    }

    #[test]
    fn oneof_and_wrapper_fields_round_trip_through_json() {
        let (generated, _) = generate(sample_file());
        let json = generated.json.expect("json emission enabled by default");
        assert!(json.contains("map.insert(\"intVal\".to_string()"));
        assert!(json.contains("map.insert(\"floatVal\".to_string()"));
        assert!(json.contains("\"label\" => {"));
        assert!(json.contains("::pbj::codec::json::string_json::to_value(inner)"));
    }

    #[test]
    fn builder_emits_real_struct_with_typed_setters() {
        let (generated, _) = generate(sample_file());
        assert!(generated.model.contains("pub struct EnvelopeBuilder"));
        assert!(generated.model.contains("pub fn new_builder() -> EnvelopeBuilder"));
        assert!(generated.model.contains("pub fn copy_builder(&self) -> EnvelopeBuilder"));
        assert!(generated.model.contains("pub fn build(self) -> Envelope"));
        assert!(generated.model.contains("pub fn payload_int_val(mut self, value: i32) -> Self"));
        assert!(generated.model.contains("pub fn payload_float_val(mut self, value: f32) -> Self"));
        // The wrapper field's setter takes the unwrapped scalar, not Option<T>.
        assert!(generated.model.contains("pub fn label(mut self, value: ::std::string::String) -> Self"));
    }

    #[test]
    fn comparable_validation_rejects_oneof_member_names() {
        use prost_types::uninterpreted_option::NamePart;
        use prost_types::UninterpretedOption;

        let mut message = sample_file().message_type.remove(0);
        message.options = Some(prost_types::MessageOptions {
            uninterpreted_option: vec![UninterpretedOption {
                name: vec![NamePart {
                    name_part: "pbj.comparable".to_owned(),
                    is_extension: true,
                }],
                string_value: Some(b"int_val".to_vec()),
                ..Default::default()
            }],
            ..Default::default()
        });
        let file = FileDescriptorProto {
            name: Some("envelope.proto".to_owned()),
            message_type: vec![message],
            ..Default::default()
        };
        assert!(try_generate(file).is_err());
    }
}
