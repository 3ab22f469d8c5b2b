//! Schema Node Model
//!
//! JSON-Schema-aware accessors over a [`JsonNode`]. Each accessor reads one
//! keyword; nothing is validated or cached.

use crate::error::Result;
use crate::json::{escape_segment, JsonNode, LiteralNode, Spanned, TextRange};

/// A schema at some position in the document
#[derive(Debug, Clone)]
pub struct SchemaNode<'a> {
    json: JsonNode<'a>,
}

/// The `type` keyword: one name or a list of alternatives
#[derive(Debug, Clone)]
pub enum TypeKeyword<'a> {
    Single(Spanned<&'a str>),
    Multiple(Vec<Spanned<&'a str>>),
}

/// The `items` keyword
#[derive(Debug, Clone)]
pub enum Items<'a> {
    Single(SchemaNode<'a>),
    /// Positional (tuple) form
    Tuple(Vec<SchemaNode<'a>>),
}

/// A `{ "propertyName": ..., "mapping": {...} }` discriminator
#[derive(Debug, Clone)]
pub struct DiscriminatorNode<'a> {
    json: JsonNode<'a>,
}

/// An ordered map of schemas (`properties`, `definitions`, `$defs`)
#[derive(Debug, Clone)]
pub struct SchemaRecord<'a> {
    json: JsonNode<'a>,
}

/// One `"key": schema` entry of a [`SchemaRecord`]
#[derive(Debug, Clone)]
pub struct SchemaRecordItem<'a> {
    pub key: Spanned<&'a str>,
    pub value: SchemaNode<'a>,
    /// Covers the key through the end of the schema
    pub range: TextRange,
}

impl<'a> From<JsonNode<'a>> for SchemaNode<'a> {
    fn from(json: JsonNode<'a>) -> Self {
        Self { json }
    }
}

impl<'a> SchemaNode<'a> {
    pub fn json(&self) -> &JsonNode<'a> {
        &self.json
    }

    pub fn pointer(&self) -> &str {
        self.json.pointer()
    }

    pub fn range(&self) -> TextRange {
        self.json.range()
    }

    pub fn property_range(&self, key: &str) -> Option<TextRange> {
        self.json.property_range(key)
    }

    fn schema(&self, key: &str) -> Option<SchemaNode<'a>> {
        self.json.child(key).map(SchemaNode::from)
    }

    fn schemas(&self, key: &str) -> Option<Vec<SchemaNode<'a>>> {
        self.json
            .array(key)
            .map(|items| items.into_iter().map(SchemaNode::from).collect())
    }

    fn record(&self, key: &str) -> Option<SchemaRecord<'a>> {
        self.json.child(key).map(|json| SchemaRecord { json })
    }

    // --- Identity ---

    pub fn reference(&self) -> Result<Option<Spanned<&'a str>>> {
        self.json.string("$ref")
    }

    pub fn title(&self) -> Result<Option<Spanned<&'a str>>> {
        self.json.string("title")
    }

    pub fn description(&self) -> Result<Option<Spanned<&'a str>>> {
        self.json.string("description")
    }

    // --- Numeric ---

    pub fn multiple_of(&self) -> Result<Option<Spanned<f64>>> {
        self.json.number("multipleOf")
    }

    pub fn maximum(&self) -> Result<Option<Spanned<f64>>> {
        self.json.number("maximum")
    }

    /// Boolean (draft 4) or numeric (draft 6+) form
    pub fn exclusive_maximum(&self) -> Result<Option<LiteralNode<'a>>> {
        self.json.literal("exclusiveMaximum")
    }

    pub fn minimum(&self) -> Result<Option<Spanned<f64>>> {
        self.json.number("minimum")
    }

    /// Boolean (draft 4) or numeric (draft 6+) form
    pub fn exclusive_minimum(&self) -> Result<Option<LiteralNode<'a>>> {
        self.json.literal("exclusiveMinimum")
    }

    // --- String ---

    pub fn max_length(&self) -> Result<Option<Spanned<f64>>> {
        self.json.number("maxLength")
    }

    pub fn min_length(&self) -> Result<Option<Spanned<f64>>> {
        self.json.number("minLength")
    }

    pub fn pattern(&self) -> Result<Option<Spanned<&'a str>>> {
        self.json.string("pattern")
    }

    pub fn format(&self) -> Result<Option<Spanned<&'a str>>> {
        self.json.string("format")
    }

    // --- Array ---

    pub fn items(&self) -> Option<Items<'a>> {
        if let Some(tuple) = self.schemas("items") {
            return Some(Items::Tuple(tuple));
        }
        self.schema("items").map(Items::Single)
    }

    pub fn max_items(&self) -> Result<Option<Spanned<f64>>> {
        self.json.number("maxItems")
    }

    pub fn min_items(&self) -> Result<Option<Spanned<f64>>> {
        self.json.number("minItems")
    }

    pub fn unique_items(&self) -> Result<Option<Spanned<bool>>> {
        self.json.boolean("uniqueItems")
    }

    // --- Object ---

    pub fn max_properties(&self) -> Result<Option<Spanned<f64>>> {
        self.json.number("maxProperties")
    }

    pub fn min_properties(&self) -> Result<Option<Spanned<f64>>> {
        self.json.number("minProperties")
    }

    /// Entries of `required`. Non-literal entries are an error.
    pub fn required(&self) -> Result<Option<Vec<LiteralNode<'a>>>> {
        match self.json.array("required") {
            Some(items) => items
                .iter()
                .map(|n| n.as_literal())
                .collect::<Result<Vec<_>>>()
                .map(Some),
            None => Ok(None),
        }
    }

    pub fn additional_properties(&self) -> Option<SchemaNode<'a>> {
        self.schema("additionalProperties")
    }

    /// `definitions`, falling back to `$defs`
    pub fn definitions(&self) -> Option<SchemaRecord<'a>> {
        self.record("definitions").or_else(|| self.record("$defs"))
    }

    pub fn properties(&self) -> Option<SchemaRecord<'a>> {
        self.record("properties")
    }

    // --- Typing ---

    /// Raw `enum` entries; may include non-literals
    pub fn enum_values(&self) -> Option<Vec<JsonNode<'a>>> {
        self.json.array("enum")
    }

    pub fn schema_type(&self) -> Result<Option<TypeKeyword<'a>>> {
        if let Some(items) = self.json.array("type") {
            let names = items
                .iter()
                .map(|n| n.as_literal())
                .collect::<Result<Vec<_>>>()?
                .iter()
                .filter_map(|l| l.as_str())
                .collect();
            return Ok(Some(TypeKeyword::Multiple(names)));
        }
        Ok(self.json.string("type")?.map(TypeKeyword::Single))
    }

    /// The `type` keyword when it names exactly one type
    pub fn simple_type(&self) -> Result<Option<&'a str>> {
        Ok(match self.schema_type()? {
            Some(TypeKeyword::Single(t)) => Some(t.value),
            _ => None,
        })
    }

    pub fn is_string_type(&self) -> Result<bool> {
        Ok(self.simple_type()? == Some("string"))
    }

    pub fn is_numeric_type(&self) -> Result<bool> {
        Ok(matches!(self.simple_type()?, Some("number") | Some("integer")))
    }

    pub fn is_array_type(&self) -> Result<bool> {
        Ok(self.simple_type()? == Some("array"))
    }

    pub fn is_object_type(&self) -> Result<bool> {
        Ok(self.simple_type()? == Some("object"))
    }

    pub fn constant(&self) -> Result<Option<LiteralNode<'a>>> {
        self.json.literal("const")
    }

    // --- Composition ---

    pub fn all_of(&self) -> Option<Vec<SchemaNode<'a>>> {
        self.schemas("allOf")
    }

    pub fn any_of(&self) -> Option<Vec<SchemaNode<'a>>> {
        self.schemas("anyOf")
    }

    pub fn one_of(&self) -> Option<Vec<SchemaNode<'a>>> {
        self.schemas("oneOf")
    }

    pub fn discriminator(&self) -> Option<DiscriminatorNode<'a>> {
        self.json.child("discriminator").map(|json| DiscriminatorNode { json })
    }
}

impl<'a> DiscriminatorNode<'a> {
    pub fn range(&self) -> TextRange {
        self.json.range()
    }

    pub fn property_name(&self) -> Result<Option<Spanned<&'a str>>> {
        self.json.string("propertyName")
    }

    /// The `mapping` object, if present
    pub fn mapping(&self) -> Option<JsonNode<'a>> {
        self.json.child("mapping")
    }
}

impl<'a> SchemaRecord<'a> {
    pub fn pointer(&self) -> &str {
        self.json.pointer()
    }

    /// Entries in source order
    pub fn children(&self) -> Vec<SchemaRecordItem<'a>> {
        self.json
            .properties()
            .iter()
            .map(|prop| {
                let pointer = format!("{}/{}", self.json.pointer(), escape_segment(&prop.key.value));
                SchemaRecordItem {
                    key: Spanned::new(prop.key.value.as_str(), prop.key.range),
                    value: SchemaNode::from(JsonNode::new(&prop.value, pointer)),
                    range: prop.range,
                }
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.json.properties().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
