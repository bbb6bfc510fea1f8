//! Derivation of the lowerCamelCase JSON field name used by
//! `pbj::schema::FieldDefinition::json_name` when a `.proto` field doesn't
//! declare an explicit `json_name` option.

pub trait ToProtoCamelCase: ToOwned {
    fn to_proto_camel_case(&self) -> Self::Owned;
}

impl ToProtoCamelCase for str {
    fn to_proto_camel_case(&self) -> Self::Owned {
        // Reference: https://protobuf.com/docs/language-spec#default-json-names
        //
        // If no json_name pseudo-option is present, the JSON name of the field will be
        // the field's name converted to camelCase. To convert to camelCase:
        //
        // - Discard any trailing underscores (_)
        // - When a leading or interior underscore is encountered, discard the underscore and
        //   capitalize the next non-underscore character encountered.
        // - Any other non-underscore and non-capitalized character is retained as is.
        let mut capitalize_next = false;
        let mut out = String::with_capacity(self.len());
        for chr in self.chars() {
            if chr == '_' {
                capitalize_next = true;
            } else if capitalize_next {
                out.push(chr.to_ascii_uppercase());
                capitalize_next = false;
            } else {
                out.push(chr);
            }
        }
        out
    }
}

impl ToProtoCamelCase for String {
    fn to_proto_camel_case(&self) -> Self::Owned {
        self.as_str().to_proto_camel_case()
    }
}

/// Resolves the `json_name` a field's `FieldDefinition` should carry: the
/// explicit `json_name` from the descriptor when present, else the field
/// name's canonical camel-case derivation.
pub fn json_name_for_field(proto_name: &str, declared_json_name: Option<&str>) -> String {
    declared_json_name
        .map(str::to_owned)
        .unwrap_or_else(|| proto_name.to_proto_camel_case())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_proto_camel_case() {
        assert_eq!("fieldName", "field_name".to_proto_camel_case());
        assert_eq!("fieldName", "_field_name".to_proto_camel_case());
        assert_eq!("fieldName", "field__name".to_proto_camel_case());
        assert_eq!("fieldName", "field_name_".to_proto_camel_case());
        assert_eq!("fieldname", "fieldname".to_proto_camel_case());
    }

    #[test]
    fn test_json_name_for_field() {
        assert_eq!("fieldName", json_name_for_field("field_name", None));
        assert_eq!(
            "custom",
            json_name_for_field("field_name", Some("custom"))
        );
    }
}
