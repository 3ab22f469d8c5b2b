//! Validation Rule Factories
//!
//! Each factory reads one keyword and produces zero or one rule. Factories
//! never see each other's output, so pipeline order only affects the order
//! of the resulting list.

use crate::error::Result;
use crate::ir::{
    loc, NonNegativeIntegerLiteral, NumberLiteral, ObjectValidationRule, StringLiteral,
    ValidationRule,
};
use crate::json::{Literal, Spanned};
use crate::schema::SchemaNode;

/// Produces at most one rule for a leaf value
pub type ValidationRuleFactory = fn(&SchemaNode<'_>) -> Result<Option<ValidationRule>>;

/// Produces at most one rule for an object
pub type ObjectValidationRuleFactory = fn(&SchemaNode<'_>) -> Result<Option<ObjectValidationRule>>;

const RULE_FACTORIES: &[ValidationRuleFactory] = &[
    string_max_length,
    string_min_length,
    string_pattern,
    string_format,
    string_enum,
    number_multiple_of,
    number_greater_than,
    number_less_than,
    array_min_items,
    array_max_items,
    array_unique_items,
];

const OBJECT_RULE_FACTORIES: &[ObjectValidationRuleFactory] = &[
    object_min_properties,
    object_max_properties,
    object_additional_properties,
];

/// Run every leaf factory against `node`
pub fn parse_validation_rules(node: &SchemaNode<'_>) -> Result<Vec<ValidationRule>> {
    let mut rules = Vec::new();
    for factory in RULE_FACTORIES {
        if let Some(rule) = factory(node)? {
            rules.push(rule);
        }
    }
    Ok(rules)
}

/// Run every object factory against `node`
pub fn parse_object_validation_rules(node: &SchemaNode<'_>) -> Result<Vec<ObjectValidationRule>> {
    let mut rules = Vec::new();
    for factory in OBJECT_RULE_FACTORIES {
        if let Some(rule) = factory(node)? {
            rules.push(rule);
        }
    }
    Ok(rules)
}

// =============================================================================
// String
// =============================================================================

pub fn string_max_length(node: &SchemaNode<'_>) -> Result<Option<ValidationRule>> {
    if !node.is_string_type()? {
        return Ok(None);
    }
    Ok(node.max_length()?.and_then(count).map(|length| ValidationRule::StringMaxLength {
        length,
        loc: node.property_range("maxLength").map(loc),
    }))
}

pub fn string_min_length(node: &SchemaNode<'_>) -> Result<Option<ValidationRule>> {
    if !node.is_string_type()? {
        return Ok(None);
    }
    Ok(node.min_length()?.and_then(count).map(|length| ValidationRule::StringMinLength {
        length,
        loc: node.property_range("minLength").map(loc),
    }))
}

pub fn string_pattern(node: &SchemaNode<'_>) -> Result<Option<ValidationRule>> {
    if !node.is_string_type()? {
        return Ok(None);
    }
    Ok(node
        .pattern()?
        .filter(|p| !p.value.is_empty())
        .map(|pattern| ValidationRule::StringPattern {
            pattern: StringLiteral::from(pattern),
            loc: node.property_range("pattern").map(loc),
        }))
}

pub fn string_format(node: &SchemaNode<'_>) -> Result<Option<ValidationRule>> {
    if !node.is_string_type()? {
        return Ok(None);
    }
    Ok(node
        .format()?
        .filter(|f| !f.value.is_empty())
        .map(|format| ValidationRule::StringFormat {
            format: StringLiteral::from(format),
            loc: node.property_range("format").map(loc),
        }))
}

pub fn string_enum(node: &SchemaNode<'_>) -> Result<Option<ValidationRule>> {
    if !node.is_string_type()? {
        return Ok(None);
    }
    let Some(entries) = node.enum_values() else {
        return Ok(None);
    };

    let values: Vec<StringLiteral> = entries
        .iter()
        .filter_map(|entry| match entry.node().as_literal() {
            Some(Literal::String(s)) => Some(StringLiteral::new(s.clone(), Some(entry.range()))),
            _ => None,
        })
        .collect();

    if values.is_empty() {
        return Ok(None);
    }

    Ok(Some(ValidationRule::StringEnum {
        values,
        loc: node.property_range("enum").map(loc),
    }))
}

// =============================================================================
// Number
// =============================================================================

pub fn number_multiple_of(node: &SchemaNode<'_>) -> Result<Option<ValidationRule>> {
    if !node.is_numeric_type()? {
        return Ok(None);
    }
    Ok(node.multiple_of()?.map(|value| ValidationRule::NumberMultipleOf {
        value: NumberLiteral::from(value),
        loc: node.property_range("multipleOf").map(loc),
    }))
}

/// `minimum`, exclusive when `exclusiveMinimum: true`. A numeric
/// `exclusiveMinimum` stands on its own only when `minimum` is absent.
pub fn number_greater_than(node: &SchemaNode<'_>) -> Result<Option<ValidationRule>> {
    if !node.is_numeric_type()? {
        return Ok(None);
    }
    let exclusive = node.exclusive_minimum()?;

    if let Some(minimum) = node.minimum()? {
        let value = NumberLiteral::from(minimum);
        let loc = node.property_range("minimum").map(loc);
        let is_exclusive = exclusive.as_ref().and_then(|e| e.value.as_bool()) == Some(true);
        return Ok(Some(if is_exclusive {
            ValidationRule::NumberGt { value, loc }
        } else {
            ValidationRule::NumberGte { value, loc }
        }));
    }

    Ok(exclusive.and_then(|e| {
        let bound = e.value.as_f64()?;
        Some(ValidationRule::NumberGt {
            value: NumberLiteral::new(bound, Some(e.range)),
            loc: node.property_range("exclusiveMinimum").map(loc),
        })
    }))
}

/// Mirror of [`number_greater_than`] for `maximum`/`exclusiveMaximum`
pub fn number_less_than(node: &SchemaNode<'_>) -> Result<Option<ValidationRule>> {
    if !node.is_numeric_type()? {
        return Ok(None);
    }
    let exclusive = node.exclusive_maximum()?;

    if let Some(maximum) = node.maximum()? {
        let value = NumberLiteral::from(maximum);
        let loc = node.property_range("maximum").map(loc);
        let is_exclusive = exclusive.as_ref().and_then(|e| e.value.as_bool()) == Some(true);
        return Ok(Some(if is_exclusive {
            ValidationRule::NumberLt { value, loc }
        } else {
            ValidationRule::NumberLte { value, loc }
        }));
    }

    Ok(exclusive.and_then(|e| {
        let bound = e.value.as_f64()?;
        Some(ValidationRule::NumberLt {
            value: NumberLiteral::new(bound, Some(e.range)),
            loc: node.property_range("exclusiveMaximum").map(loc),
        })
    }))
}

// =============================================================================
// Array
// =============================================================================

pub fn array_min_items(node: &SchemaNode<'_>) -> Result<Option<ValidationRule>> {
    if !node.is_array_type()? {
        return Ok(None);
    }
    Ok(node.min_items()?.and_then(count).map(|min| ValidationRule::ArrayMinItems {
        min,
        loc: node.property_range("minItems").map(loc),
    }))
}

pub fn array_max_items(node: &SchemaNode<'_>) -> Result<Option<ValidationRule>> {
    if !node.is_array_type()? {
        return Ok(None);
    }
    Ok(node.max_items()?.and_then(count).map(|max| ValidationRule::ArrayMaxItems {
        max,
        loc: node.property_range("maxItems").map(loc),
    }))
}

pub fn array_unique_items(node: &SchemaNode<'_>) -> Result<Option<ValidationRule>> {
    if !node.is_array_type()? {
        return Ok(None);
    }
    Ok(node
        .unique_items()?
        .filter(|u| u.value)
        .map(|_| ValidationRule::ArrayUniqueItems {
            required: true,
            loc: node.property_range("uniqueItems").map(loc),
        }))
}

// =============================================================================
// Object
// =============================================================================

pub fn object_min_properties(node: &SchemaNode<'_>) -> Result<Option<ObjectValidationRule>> {
    if !node.is_object_type()? {
        return Ok(None);
    }
    Ok(node.min_properties()?.and_then(count).map(|min| ObjectValidationRule::ObjectMinProperties {
        min,
        loc: node.property_range("minProperties").map(loc),
    }))
}

pub fn object_max_properties(node: &SchemaNode<'_>) -> Result<Option<ObjectValidationRule>> {
    if !node.is_object_type()? {
        return Ok(None);
    }
    Ok(node.max_properties()?.and_then(count).map(|max| ObjectValidationRule::ObjectMaxProperties {
        max,
        loc: node.property_range("maxProperties").map(loc),
    }))
}

/// `additionalProperties` is parsed but not yet translated into a rule
pub fn object_additional_properties(_node: &SchemaNode<'_>) -> Result<Option<ObjectValidationRule>> {
    Ok(None)
}

/// Counts must be non-negative integers; anything else produces no rule
fn count(n: Spanned<f64>) -> Option<NonNegativeIntegerLiteral> {
    if n.value >= 0.0 && n.value.fract() == 0.0 && n.value <= u64::MAX as f64 {
        Some(NonNegativeIntegerLiteral::new(n.value as u64, Some(n.range)))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::{parse_document, JsonNode};

    fn rules_for(source: &str) -> Vec<ValidationRule> {
        let doc = parse_document(source).unwrap();
        let node = SchemaNode::from(JsonNode::root(&doc));
        parse_validation_rules(&node).unwrap()
    }

    fn ids(rules: &[ValidationRule]) -> Vec<&'static str> {
        rules.iter().map(|r| r.id()).collect()
    }

    #[test]
    fn test_string_length_rules() {
        let rules = rules_for(r#"{"type": "string", "minLength": 1, "maxLength": 10}"#);
        assert_eq!(rules.len(), 2);
        assert!(rules.iter().any(|r| matches!(
            r,
            ValidationRule::StringMinLength { length, .. } if length.value == 1
        )));
        assert!(rules.iter().any(|r| matches!(
            r,
            ValidationRule::StringMaxLength { length, .. } if length.value == 10
        )));
    }

    #[test]
    fn test_guards_skip_other_types() {
        // Length keywords on a number and bounds on a string produce nothing
        assert!(rules_for(r#"{"type": "integer", "minLength": 1}"#).is_empty());
        assert!(rules_for(r#"{"type": "string", "minimum": 1}"#).is_empty());
        assert!(rules_for(r#"{"minLength": 1}"#).is_empty());
    }

    #[test]
    fn test_numeric_bounds() {
        let rules = rules_for(r#"{"type": "number", "minimum": 0, "maximum": 10, "multipleOf": 0.5}"#);
        assert_eq!(ids(&rules), vec!["NumberMultipleOf", "NumberGTE", "NumberLTE"]);

        let rules = rules_for(
            r#"{"type": "integer", "minimum": 0, "exclusiveMinimum": true, "maximum": 9, "exclusiveMaximum": true}"#,
        );
        assert_eq!(ids(&rules), vec!["NumberGT", "NumberLT"]);

        let rules = rules_for(r#"{"type": "number", "exclusiveMinimum": 5}"#);
        match rules.as_slice() {
            [ValidationRule::NumberGt { value, .. }] => assert_eq!(value.value, 5.0),
            other => panic!("Expected one NumberGT, got {:?}", other),
        }
    }

    #[test]
    fn test_array_rules() {
        let rules = rules_for(r#"{"type": "array", "minItems": 1, "maxItems": 3, "uniqueItems": true}"#);
        assert_eq!(ids(&rules), vec!["ArrayMinItems", "ArrayMaxItems", "ArrayUniqueItems"]);

        assert!(rules_for(r#"{"type": "array", "uniqueItems": false}"#).is_empty());
        assert!(rules_for(r#"{"type": "array", "minItems": -1}"#).is_empty());
    }

    #[test]
    fn test_string_pattern_format_enum() {
        let rules = rules_for(r#"{"type": "string", "pattern": "^a", "format": "email", "enum": ["a", 1, "b"]}"#);
        assert_eq!(ids(&rules), vec!["StringPattern", "StringFormat", "StringEnum"]);
        match &rules[2] {
            ValidationRule::StringEnum { values, .. } => assert_eq!(values.len(), 2),
            other => panic!("Expected StringEnum, got {:?}", other),
        }
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let doc = parse_document(r#"{"type": "string", "maxLength": 4, "pattern": "x"}"#).unwrap();
        let node = SchemaNode::from(JsonNode::root(&doc));
        let first = parse_validation_rules(&node).unwrap();
        let second = parse_validation_rules(&node).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_object_rules() {
        let doc = parse_document(r#"{"type": "object", "minProperties": 1, "maxProperties": 2, "additionalProperties": false}"#).unwrap();
        let node = SchemaNode::from(JsonNode::root(&doc));
        let rules = parse_object_validation_rules(&node).unwrap();
        assert_eq!(rules.len(), 2);
    }
}
