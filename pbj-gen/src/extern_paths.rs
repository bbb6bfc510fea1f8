use std::collections::{hash_map, HashMap};

use itertools::Itertools;

use crate::ident::{to_snake, to_upper_camel};

fn validate_proto_path(path: &str) -> Result<(), String> {
    if path.chars().next().map(|c| c != '.').unwrap_or(true) {
        return Err(format!(
            "Protobuf paths must be fully qualified (begin with a leading '.'): {}",
            path
        ));
    }
    if path.split('.').skip(1).any(str::is_empty) {
        return Err(format!("invalid fully-qualified Protobuf path: {}", path));
    }
    Ok(())
}

#[derive(Debug)]
struct ExternPathEntry {
    rust_path: String,
    is_well_known: bool,
    /// `true` when the path resolves a `google.protobuf.*Value` wrapper message directly to its
    /// bare scalar type (e.g. `.google.protobuf.Int32Value` -> `i32`). Fields whose resolved type
    /// came from such an entry are represented as `Option<T>` rather than as a nested message.
    is_optional_wrapper: bool,
}

#[derive(Debug)]
pub struct ResolvedPath {
    pub rust_path: String,
    #[allow(dead_code)]
    pub is_well_known: bool,
    pub is_optional_wrapper: bool,
}

#[derive(Debug)]
pub struct ExternPaths {
    extern_paths: HashMap<String, ExternPathEntry>,
}

impl ExternPaths {
    pub fn new(paths: &[(String, String)], well_known_types: bool) -> Result<ExternPaths, String> {
        let mut extern_paths = ExternPaths {
            extern_paths: HashMap::new(),
        };

        for (proto_path, rust_path) in paths {
            extern_paths.insert(proto_path.clone(), rust_path.clone(), false, false)?;
        }

        if well_known_types {
            extern_paths.insert_well_known(
                ".google.protobuf.Timestamp".to_string(),
                "::pbj_types::Timestamp".to_string(),
            )?;
            extern_paths.insert_well_known(
                ".google.protobuf.Duration".to_string(),
                "::pbj_types::Duration".to_string(),
            )?;
            extern_paths.insert_well_known(
                ".google.protobuf.Any".to_string(),
                "::pbj_types::Any".to_string(),
            )?;
            extern_paths
                .insert_well_known(".google.protobuf.Empty".to_string(), "()".to_string())?;

            for (name, rust_type) in [
                ("BoolValue", "bool"),
                ("BytesValue", "::std::vec::Vec<u8>"),
                ("DoubleValue", "f64"),
                ("FloatValue", "f32"),
                ("Int32Value", "i32"),
                ("Int64Value", "i64"),
                ("StringValue", "::std::string::String"),
                ("UInt32Value", "u32"),
                ("UInt64Value", "u64"),
            ] {
                extern_paths.insert(
                    format!(".google.protobuf.{name}"),
                    rust_type.to_string(),
                    true,
                    true,
                )?;
            }
        }

        Ok(extern_paths)
    }

    fn insert_well_known(&mut self, proto_path: String, rust_path: String) -> Result<(), String> {
        self.insert(proto_path, rust_path, true, false)
    }

    fn insert(
        &mut self,
        proto_path: String,
        rust_path: String,
        is_well_known: bool,
        is_optional_wrapper: bool,
    ) -> Result<(), String> {
        validate_proto_path(&proto_path)?;
        match self.extern_paths.entry(proto_path) {
            hash_map::Entry::Occupied(occupied) => {
                return Err(format!(
                    "duplicate extern Protobuf path: {}",
                    occupied.key()
                ));
            }
            hash_map::Entry::Vacant(vacant) => vacant.insert(ExternPathEntry {
                rust_path,
                is_well_known,
                is_optional_wrapper,
            }),
        };
        Ok(())
    }

    pub fn resolve_ident(&self, pb_ident: &str) -> Option<ResolvedPath> {
        // The generator input's type names are always fully qualified.
        assert_eq!(".", &pb_ident[..1]);

        if let Some(ExternPathEntry {
            rust_path,
            is_well_known,
            is_optional_wrapper,
        }) = self.extern_paths.get(pb_ident)
        {
            return Some(ResolvedPath {
                rust_path: rust_path.clone(),
                is_well_known: *is_well_known,
                is_optional_wrapper: *is_optional_wrapper,
            });
        }

        for (idx, _) in pb_ident.rmatch_indices('.') {
            if let Some(entry) = self.extern_paths.get(&pb_ident[..idx]) {
                let mut segments = pb_ident[idx + 1..].split('.');
                let ident_type = segments.next_back().map(to_upper_camel);

                let rust_path = entry
                    .rust_path
                    .split("::")
                    .chain(segments)
                    .enumerate()
                    .map(|(idx, segment)| {
                        if idx == 0 && segment == "crate" {
                            // If the first segment of the path is 'crate', then do not escape
                            // it into a raw identifier, since it's being used as the keyword.
                            segment.to_owned()
                        } else {
                            to_snake(segment)
                        }
                    })
                    .chain(ident_type.into_iter())
                    .join("::");

                return Some(ResolvedPath {
                    rust_path,
                    is_well_known: entry.is_well_known,
                    is_optional_wrapper: false,
                });
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn test_extern_paths() {
        let paths = ExternPaths::new(
            &[
                (".foo".to_string(), "::foo1".to_string()),
                (".foo.bar".to_string(), "::foo2".to_string()),
                (".foo.baz".to_string(), "::foo3".to_string()),
                (".foo.Fuzz".to_string(), "::foo4::Fuzz".to_string()),
                (".a.b.c.d.e.f".to_string(), "::abc::def".to_string()),
            ],
            false,
        )
        .unwrap();

        let case = |proto_ident: &str, resolved_ident: &str| {
            assert_eq!(
                paths.resolve_ident(proto_ident).unwrap().rust_path,
                resolved_ident
            );
        };

        case(".foo", "::foo1");
        case(".foo.Foo", "::foo1::Foo");
        case(".foo.bar", "::foo2");
        case(".foo.Bas", "::foo1::Bas");

        case(".foo.bar.Bar", "::foo2::Bar");
        case(".foo.Fuzz.Bar", "::foo4::fuzz::Bar");

        case(".a.b.c.d.e.f", "::abc::def");
        case(".a.b.c.d.e.f.g.FooBar.Baz", "::abc::def::g::foo_bar::Baz");

        assert!(paths.resolve_ident(".a").is_none());
        assert!(paths.resolve_ident(".a.b").is_none());
        assert!(paths.resolve_ident(".a.c").is_none());
    }

    #[test]
    fn test_well_known_types() {
        let paths = ExternPaths::new(&[], true).unwrap();

        let case = |proto_ident: &str, resolved_ident: &str| {
            assert_eq!(
                paths.resolve_ident(proto_ident).unwrap().rust_path,
                resolved_ident
            );
        };

        case(".google.protobuf.Timestamp", "::pbj_types::Timestamp");
        case(".google.protobuf.Duration", "::pbj_types::Duration");
        case(".google.protobuf.Empty", "()");

        assert!(
            paths
                .resolve_ident(".google.protobuf.Int32Value")
                .unwrap()
                .is_optional_wrapper
        );
        assert!(!paths.resolve_ident(".google.protobuf.Timestamp").unwrap().is_optional_wrapper);
    }

    #[test]
    fn test_error_fully_qualified() {
        let paths = [("foo".to_string(), "bar".to_string())];
        let err = ExternPaths::new(&paths, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Protobuf paths must be fully qualified (begin with a leading '.'): foo"
        )
    }

    #[test]
    fn test_error_invalid_path() {
        let paths = [(".foo.".to_string(), "bar".to_string())];
        let err = ExternPaths::new(&paths, false).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid fully-qualified Protobuf path: .foo."
        )
    }

    #[test]
    fn test_error_duplicate() {
        let paths = [
            (".foo".to_string(), "bar".to_string()),
            (".foo".to_string(), "bar".to_string()),
        ];
        let err = ExternPaths::new(&paths, false).unwrap_err();
        assert_eq!(err.to_string(), "duplicate extern Protobuf path: .foo")
    }
}
