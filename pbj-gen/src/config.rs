//! Builder for a generator invocation: attribute injection, output
//! locations, and the `compile_fds`/`generate` entry points.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use prost_types::{FileDescriptorProto, FileDescriptorSet};

use crate::code_generator::CodeGenerator;
use crate::context::Context;
use crate::error::{DuplicateArtifact, GeneratorError, UnresolvedReference};
use crate::extern_paths::ExternPaths;
use crate::message_graph::MessageGraph;
use crate::module::Module;
use crate::path::{Matcher, PathMap};

/// The generated sources for one `.proto` package: a model/schema/codec
/// module nest, written to a single file per package.
#[derive(Debug, Clone, Default)]
pub struct GeneratedModule {
    pub model: String,
    pub schema: String,
    pub codec: String,
    pub json: Option<String>,
}

impl GeneratedModule {
    /// Renders the four (or three, with JSON disabled) nested submodules into
    /// the single file this package's sources are written to.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("pub mod model {\n");
        out.push_str(&self.model);
        out.push_str("}\n\npub mod schema {\n");
        out.push_str(&self.schema);
        out.push_str("}\n\npub mod codec {\n");
        out.push_str(&self.codec);
        out.push_str("}\n");
        if let Some(json) = &self.json {
            out.push_str("\npub mod json {\n");
            out.push_str(json);
            out.push_str("}\n");
        }
        out
    }
}

/// Configuration for a `pbj-gen` invocation.
///
/// Construct with [`Config::new`], adjust with the builder methods, then feed
/// it a set of already-parsed `.proto` file descriptors via
/// [`Config::compile_fds`] or [`Config::generate`].
pub struct Config {
    pub(crate) type_attributes: PathMap<Vec<String>, ()>,
    pub(crate) message_attributes: PathMap<Vec<String>, ()>,
    pub(crate) enum_attributes: PathMap<Vec<String>, ()>,
    pub(crate) field_attributes: PathMap<Vec<String>, ()>,
    pub(crate) boxed: PathMap<(), ()>,
    pub(crate) disable_comments: PathMap<(), ()>,
    pub(crate) skip_debug: PathMap<(), ()>,
    pub(crate) type_name_domains: PathMap<String, ()>,
    pub(crate) well_known_types: bool,
    pub(crate) strip_enum_prefix: bool,
    pub(crate) out_dir: Option<PathBuf>,
    pub(crate) test_factory_out_dir: Option<PathBuf>,
    pub(crate) extern_paths: Vec<(String, String)>,
    pub(crate) default_package_filename: String,
    pub(crate) enable_type_names: bool,
    pub(crate) emit_json: bool,
    pub(crate) strict_options: bool,
    pub(crate) runtime_path: Option<String>,
    pub(crate) format: bool,
}

impl Config {
    /// Creates a new code generator configuration with default options.
    pub fn new() -> Config {
        Config::default()
    }

    /// Adds additional attributes (such as `#[derive(...)]` or `#[serde(...)]`) to a generated
    /// message field.
    ///
    /// `path` follows the same prefix/suffix matching rules as the rest of this builder: a
    /// leading `.` anchors to a fully-qualified Protobuf path; otherwise the path suffix-matches
    /// against `message.field`.
    pub fn field_attribute<P, A>(&mut self, path: P, attribute: A) -> &mut Self
    where
        P: AsRef<str>,
        A: AsRef<str>,
    {
        self.field_attributes
            .entry_or_default(Matcher::from(path.as_ref()))
            .push(attribute.as_ref().to_owned());
        self
    }

    /// Adds additional attributes to a generated message, enum, or oneof type.
    pub fn type_attribute<P, A>(&mut self, path: P, attribute: A) -> &mut Self
    where
        P: AsRef<str>,
        A: AsRef<str>,
    {
        self.type_attributes
            .entry_or_default(Matcher::from(path.as_ref()))
            .push(attribute.as_ref().to_owned());
        self
    }

    /// Adds additional attributes to a generated message type only (not enums/oneofs).
    pub fn message_attribute<P, A>(&mut self, path: P, attribute: A) -> &mut Self
    where
        P: AsRef<str>,
        A: AsRef<str>,
    {
        self.message_attributes
            .entry_or_default(Matcher::from(path.as_ref()))
            .push(attribute.as_ref().to_owned());
        self
    }

    /// Adds additional attributes to a generated enum type only.
    pub fn enum_attribute<P, A>(&mut self, path: P, attribute: A) -> &mut Self
    where
        P: AsRef<str>,
        A: AsRef<str>,
    {
        self.enum_attributes
            .entry_or_default(Matcher::from(path.as_ref()))
            .push(attribute.as_ref().to_owned());
        self
    }

    /// Marks a message field as needing to be `Box<_>`-wrapped, beyond what recursive-type
    /// detection already forces.
    pub fn boxed<P>(&mut self, path: P) -> &mut Self
    where
        P: AsRef<str>,
    {
        self.boxed.insert(Matcher::from(path.as_ref()), ());
        self
    }

    /// Suppresses doc comments on the named message, enum, or field.
    pub fn disable_comments<P>(&mut self, path: P) -> &mut Self
    where
        P: AsRef<str>,
    {
        self.disable_comments.insert(Matcher::from(path.as_ref()), ());
        self
    }

    /// Suppresses the `#[derive(Debug)]` that would otherwise be emitted for the named message.
    pub fn skip_debug<P>(&mut self, path: P) -> &mut Self
    where
        P: AsRef<str>,
    {
        self.skip_debug.insert(Matcher::from(path.as_ref()), ());
        self
    }

    /// Configures the code generator to not resolve `google.protobuf.*` well-known types against
    /// `pbj-types`, generating ordinary messages for them instead.
    pub fn compile_well_known_types(&mut self) -> &mut Self {
        self.well_known_types = false;
        self
    }

    /// Declares an `extern` Protobuf type, resolved to a pre-existing Rust path instead of being
    /// generated fresh.
    pub fn extern_path<P1, P2>(&mut self, proto_path: P1, rust_path: P2) -> &mut Self
    where
        P1: Into<String>,
        P2: Into<String>,
    {
        self.extern_paths.push((proto_path.into(), rust_path.into()));
        self
    }

    /// Retains a message's declared enum variant name prefix instead of stripping it.
    pub fn retain_enum_prefix(&mut self) -> &mut Self {
        self.strip_enum_prefix = false;
        self
    }

    /// Sets the output directory for generated model/schema/codec files.
    pub fn out_dir<P: AsRef<Path>>(&mut self, path: P) -> &mut Self {
        self.out_dir = Some(path.as_ref().to_owned());
        self
    }

    /// Sets the output directory for generated test-argument factory files.
    pub fn test_factory_out_dir<P: AsRef<Path>>(&mut self, path: P) -> &mut Self {
        self.test_factory_out_dir = Some(path.as_ref().to_owned());
        self
    }

    /// Sets the file name used for a `.proto` file with no declared package.
    pub fn default_package_filename<S: AsRef<str>>(&mut self, filename: S) -> &mut Self {
        self.default_package_filename = filename.as_ref().to_owned();
        self
    }

    /// Enables emission of a `pbj_types::Name` impl for every message.
    pub fn enable_type_names(&mut self) -> &mut Self {
        self.enable_type_names = true;
        self
    }

    /// Sets a type URL domain (other than `type.googleapis.com`) for messages matching `paths`.
    pub fn type_name_domain<I, S, D>(&mut self, paths: I, domain: D) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        D: AsRef<str>,
    {
        for path in paths {
            self.type_name_domains
                .insert(Matcher::from(path.as_ref()), domain.as_ref().to_owned());
        }
        self
    }

    /// Sets the path to the runtime crate generated code is written against. Defaults to `::pbj`.
    pub fn runtime_path<S: AsRef<str>>(&mut self, path: S) -> &mut Self {
        self.runtime_path = Some(path.as_ref().to_owned());
        self
    }

    /// Toggles `JsonMessage` codec emission. Enabled by default.
    pub fn emit_json(&mut self, enabled: bool) -> &mut Self {
        self.emit_json = enabled;
        self
    }

    /// Toggles strict handling of unrecognized `pbj.*` custom options: when enabled (the
    /// default), an unrecognized `pbj.*` option key is a hard `GeneratorError`. Other unrecognized
    /// custom options are always logged and ignored regardless of this setting.
    pub fn strict_options(&mut self, enabled: bool) -> &mut Self {
        self.strict_options = enabled;
        self
    }

    /// Enables or disables running the generated source through `prettyplease` before it's
    /// returned. Enabled by default when the `format` feature is active.
    pub fn format(&mut self, enabled: bool) -> &mut Self {
        self.format = enabled;
        self
    }

    /// Generates code for the messages and enums in the given `FileDescriptorSet`, writing the
    /// output to [`Config::out_dir`] (and [`Config::test_factory_out_dir`]).
    pub fn compile_fds(&mut self, fds: FileDescriptorSet) -> Result<(), GeneratorError> {
        let requests = fds
            .file
            .into_iter()
            .map(|file| {
                let module = Module::from_protobuf_package_name(file.package.as_deref().unwrap_or(""));
                (module, file)
            })
            .collect();

        let (modules, test_factories) = self.generate(requests)?;

        let out_dir = self.out_dir.clone().unwrap_or_else(std::env::temp_dir);
        for (module, generated) in &modules {
            let file_path = out_dir.join(module.to_file_name_or(&self.default_package_filename));
            let rendered = generated.render();
            let source = if self.format { format_source(&rendered) } else { rendered };
            write_file(&file_path, &source)?;
        }

        if let Some(test_dir) = self.test_factory_out_dir.clone() {
            for (module, source) in &test_factories {
                let file_path = test_dir.join(module.to_file_name_or(&self.default_package_filename));
                write_file(&file_path, source)?;
            }
        }

        Ok(())
    }

    /// Generates code for a set of requests (module, file descriptor), without touching the
    /// filesystem. Returns the per-package model/schema/codec sources and, separately, the
    /// per-package test-argument factory sources.
    pub fn generate(
        &mut self,
        requests: Vec<(Module, FileDescriptorProto)>,
    ) -> Result<(HashMap<Module, GeneratedModule>, HashMap<Module, String>), GeneratorError> {
        let extern_paths = ExternPaths::new(&self.extern_paths, self.well_known_types).map_err(|message| {
            UnresolvedReference::new(message, "Config::extern_path".to_owned())
        })?;

        let message_graph = MessageGraph::new(requests.iter().map(|(_, f)| f))
            .map_err(|message| UnresolvedReference::new(message, "Config::generate".to_owned()))?;

        let known_packages: Vec<String> = requests
            .iter()
            .map(|(_, f)| f.package.clone().unwrap_or_default())
            .collect();

        let mut modules: HashMap<Module, GeneratedModule> = HashMap::new();
        let mut test_factories: HashMap<Module, String> = HashMap::new();
        let mut seen_messages = std::collections::HashSet::new();

        for (module, file) in requests {
            let context = Context::new(self, &message_graph, &extern_paths, &known_packages);
            let (generated, test_factory) = CodeGenerator::generate(&context, &mut seen_messages, file)?;

            let entry = modules.entry(module.clone()).or_default();
            entry.model.push_str(&generated.model);
            entry.schema.push_str(&generated.schema);
            entry.codec.push_str(&generated.codec);
            match (&mut entry.json, generated.json) {
                (Some(existing), Some(new)) => existing.push_str(&new),
                (slot @ None, Some(new)) => *slot = Some(new),
                _ => {}
            }

            test_factories.entry(module).or_default().push_str(&test_factory);
        }

        Ok((modules, test_factories))
    }
}

/// Runs generated source through `prettyplease` when the `format` feature is
/// compiled in; falls back to returning `source` unchanged, both when the
/// feature is off and when the source fails to parse as a single file.
#[cfg(feature = "format")]
fn format_source(source: &str) -> String {
    match syn::parse_file(source) {
        Ok(file) => prettyplease::unparse(&file),
        Err(_) => source.to_owned(),
    }
}

#[cfg(not(feature = "format"))]
fn format_source(source: &str) -> String {
    source.to_owned()
}

fn write_file(path: &Path, contents: &str) -> Result<(), GeneratorError> {
    std::fs::write(path, contents).map_err(|_| {
        DuplicateArtifact::new(path.display().to_string())
    })
}

impl Default for Config {
    fn default() -> Config {
        Config {
            type_attributes: PathMap::default(),
            message_attributes: PathMap::default(),
            enum_attributes: PathMap::default(),
            field_attributes: PathMap::default(),
            boxed: PathMap::default(),
            disable_comments: PathMap::default(),
            skip_debug: PathMap::default(),
            type_name_domains: PathMap::default(),
            well_known_types: true,
            strip_enum_prefix: true,
            out_dir: None,
            test_factory_out_dir: None,
            extern_paths: Vec::new(),
            default_package_filename: "_".to_string(),
            enable_type_names: false,
            emit_json: true,
            strict_options: true,
            runtime_path: None,
            format: cfg!(feature = "format"),
        }
    }
}
