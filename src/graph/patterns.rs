//! Schema Kind Detection
//!
//! Classifies a schema node into exactly one [`SchemaKind`]. This is pure
//! shape detection; the builder decides what each kind produces.

use crate::error::Result;
use crate::ir::Primitive;
use crate::json::{JsonNode, Spanned};
use crate::schema::{Items, SchemaNode, TypeKeyword};

// =============================================================================
// Schema Kind
// =============================================================================

/// Shape of a schema node, first match in declaration order wins
#[derive(Debug, Clone)]
pub enum SchemaKind<'a> {
    /// `{"$ref": "#/..."}`; sibling keywords other than `description` are ignored
    Ref(Spanned<&'a str>),
    /// `{"allOf": [...]}`
    Intersection(Vec<SchemaNode<'a>>),
    /// `{"anyOf": [...]}`
    AnyOf,
    /// `{"oneOf": [...]}`
    OneOf(Vec<SchemaNode<'a>>),
    /// `{"type": ["string", "null"]}`
    TypeArray,
    /// `{"enum": [...]}`, with or without `type`
    Enum(Vec<JsonNode<'a>>),
    /// `{"type": "object"}`
    Object,
    /// `{"type": "array"}` with its `items`, if any
    Array(Option<Items<'a>>),
    /// Anything else, including schemas without `type`
    Primitive,
}

impl SchemaKind<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ref(_) => "ref",
            Self::Intersection(_) => "allOf",
            Self::AnyOf => "anyOf",
            Self::OneOf(_) => "oneOf",
            Self::TypeArray => "type-array",
            Self::Enum(_) => "enum",
            Self::Object => "object",
            Self::Array(_) => "array",
            Self::Primitive => "primitive",
        }
    }
}

/// Detect the kind of `schema`
pub fn detect_kind<'a>(schema: &SchemaNode<'a>) -> Result<SchemaKind<'a>> {
    if let Some(target) = schema.reference()? {
        return Ok(SchemaKind::Ref(target));
    }

    if let Some(members) = schema.all_of() {
        return Ok(SchemaKind::Intersection(members));
    }

    if schema.any_of().is_some() {
        return Ok(SchemaKind::AnyOf);
    }

    if let Some(members) = schema.one_of() {
        return Ok(SchemaKind::OneOf(members));
    }

    let schema_type = schema.schema_type()?;
    if matches!(schema_type, Some(TypeKeyword::Multiple(_))) {
        return Ok(SchemaKind::TypeArray);
    }

    if let Some(entries) = schema.enum_values() {
        return Ok(SchemaKind::Enum(entries));
    }

    Ok(match schema_type {
        Some(TypeKeyword::Single(t)) if t.value == "object" => SchemaKind::Object,
        Some(TypeKeyword::Single(t)) if t.value == "array" => SchemaKind::Array(schema.items()),
        _ => SchemaKind::Primitive,
    })
}

// =============================================================================
// Primitive Mapping
// =============================================================================

/// Map `type` + `format` onto the primitive vocabulary.
///
/// `None` for `null`, a missing type, and anything unrecognized.
pub fn primitive_for(type_name: Option<&str>, format: Option<&str>) -> Option<Primitive> {
    match (type_name?, format) {
        ("boolean", _) => Some(Primitive::Boolean),
        ("integer", Some("int64")) => Some(Primitive::Long),
        ("integer", _) => Some(Primitive::Integer),
        ("number", Some("float")) => Some(Primitive::Float),
        ("number", Some("double")) => Some(Primitive::Double),
        ("number", _) => Some(Primitive::Number),
        ("string", Some("date")) => Some(Primitive::Date),
        ("string", Some("date-time")) => Some(Primitive::DateTime),
        ("string", _) => Some(Primitive::String),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::parse_document;

    fn kind_of(source: &str) -> &'static str {
        let doc = parse_document(source).unwrap();
        let schema = SchemaNode::from(JsonNode::root(&doc));
        detect_kind(&schema).unwrap().name()
    }

    #[test]
    fn test_priority_order() {
        // $ref wins over everything else
        assert_eq!(kind_of(r##"{"$ref": "#/a", "type": "object", "allOf": []}"##), "ref");
        assert_eq!(kind_of(r#"{"allOf": [], "oneOf": []}"#), "allOf");
        assert_eq!(kind_of(r#"{"anyOf": [], "oneOf": []}"#), "anyOf");
        assert_eq!(kind_of(r#"{"oneOf": [], "type": ["string", "null"]}"#), "oneOf");
        assert_eq!(kind_of(r#"{"type": ["string", "null"], "enum": ["a"]}"#), "type-array");
        assert_eq!(kind_of(r#"{"type": "object", "enum": ["a"]}"#), "enum");
    }

    #[test]
    fn test_plain_types() {
        assert_eq!(kind_of(r#"{"type": "object"}"#), "object");
        assert_eq!(kind_of(r#"{"type": "array"}"#), "array");
        assert_eq!(kind_of(r#"{"type": "string"}"#), "primitive");
        assert_eq!(kind_of(r#"{}"#), "primitive");
    }

    #[test]
    fn test_primitive_mapping() {
        assert_eq!(primitive_for(Some("integer"), Some("int64")), Some(Primitive::Long));
        assert_eq!(primitive_for(Some("integer"), Some("int32")), Some(Primitive::Integer));
        assert_eq!(primitive_for(Some("number"), Some("float")), Some(Primitive::Float));
        assert_eq!(primitive_for(Some("string"), Some("date-time")), Some(Primitive::DateTime));
        assert_eq!(primitive_for(Some("string"), Some("uuid")), Some(Primitive::String));
        assert_eq!(primitive_for(Some("null"), None), None);
        assert_eq!(primitive_for(None, Some("date")), None);
    }
}
