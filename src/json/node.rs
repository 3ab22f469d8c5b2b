//! Typed accessor facade over the parsed tree

use super::{escape_segment, Literal, Node, Property, Spanned, TextRange};
use crate::error::{ParseError, Result};

/// A position in the document: a node plus the JSON Pointer that reaches it.
///
/// Views are recomputed on demand and never cached.
#[derive(Debug, Clone)]
pub struct JsonNode<'a> {
    node: &'a Node,
    pointer: String,
}

/// A literal leaf read through [`JsonNode::literal`]
#[derive(Debug, Clone)]
pub struct LiteralNode<'a> {
    pub value: &'a Literal,
    pub range: TextRange,
    pub pointer: String,
}

impl<'a> LiteralNode<'a> {
    pub fn as_str(&self) -> Option<Spanned<&'a str>> {
        self.value.as_str().map(|s| Spanned::new(s, self.range))
    }
}

impl<'a> JsonNode<'a> {
    pub fn new(node: &'a Node, pointer: impl Into<String>) -> Self {
        Self {
            node,
            pointer: pointer.into(),
        }
    }

    /// View over a document root (pointer `#`)
    pub fn root(node: &'a Node) -> Self {
        Self::new(node, "#")
    }

    pub fn node(&self) -> &'a Node {
        self.node
    }

    /// JSON Pointer of this position, e.g. `#/definitions/Pet`
    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    pub fn range(&self) -> TextRange {
        self.node.range
    }

    /// Object members in source order (empty for non-objects)
    pub fn properties(&self) -> &'a [Property] {
        self.node.as_object().unwrap_or(&[])
    }

    pub fn property(&self, key: &str) -> Option<&'a Property> {
        self.node.property(key)
    }

    /// Range of the whole `"key": value` member
    pub fn property_range(&self, key: &str) -> Option<TextRange> {
        self.property(key).map(|p| p.range)
    }

    fn child_pointer(&self, key: &str) -> String {
        format!("{}/{}", self.pointer, escape_segment(key))
    }

    pub fn child(&self, key: &str) -> Option<JsonNode<'a>> {
        let prop = self.property(key)?;
        Some(JsonNode::new(&prop.value, self.child_pointer(key)))
    }

    /// Children of an array-valued key. `None` if absent or not an array.
    pub fn array(&self, key: &str) -> Option<Vec<JsonNode<'a>>> {
        let prop = self.property(key)?;
        let items = prop.value.as_array()?;
        let base = self.child_pointer(key);
        Some(
            items
                .iter()
                .enumerate()
                .map(|(i, n)| JsonNode::new(n, format!("{}/{}", base, i)))
                .collect(),
        )
    }

    /// This node as a literal, failing if it is an object or array
    pub fn as_literal(&self) -> Result<LiteralNode<'a>> {
        match self.node.as_literal() {
            Some(value) => Ok(LiteralNode {
                value,
                range: self.node.range,
                pointer: self.pointer.clone(),
            }),
            None => Err(ParseError::NotALiteral {
                pointer: self.pointer.clone(),
            }),
        }
    }

    /// Literal child. Absent keys are `Ok(None)`; a non-literal value is an error.
    pub fn literal(&self, key: &str) -> Result<Option<LiteralNode<'a>>> {
        self.child(key).map(|c| c.as_literal()).transpose()
    }

    /// String child; a literal of another kind reads as absent
    pub fn string(&self, key: &str) -> Result<Option<Spanned<&'a str>>> {
        Ok(self.literal(key)?.and_then(|l| l.as_str()))
    }

    /// Number child; a literal of another kind reads as absent
    pub fn number(&self, key: &str) -> Result<Option<Spanned<f64>>> {
        Ok(self
            .literal(key)?
            .and_then(|l| l.value.as_f64().map(|n| Spanned::new(n, l.range))))
    }

    /// Boolean child; a literal of another kind reads as absent
    pub fn boolean(&self, key: &str) -> Result<Option<Spanned<bool>>> {
        Ok(self
            .literal(key)?
            .and_then(|l| l.value.as_bool().map(|b| Spanned::new(b, l.range))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::parse_document;

    #[test]
    fn test_child_pointers() {
        let doc = parse_document(r#"{"definitions": {"a/b": {"type": "string"}}}"#).unwrap();
        let root = JsonNode::root(&doc);
        let defs = root.child("definitions").unwrap();
        assert_eq!(defs.pointer(), "#/definitions");
        let ab = defs.child("a/b").unwrap();
        assert_eq!(ab.pointer(), "#/definitions/a~1b");
        assert_eq!(ab.string("type").unwrap().unwrap().value, "string");
    }

    #[test]
    fn test_array_children() {
        let doc = parse_document(r#"{"oneOf": [{}, {}], "title": "x"}"#).unwrap();
        let root = JsonNode::root(&doc);
        let members = root.array("oneOf").unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[1].pointer(), "#/oneOf/1");
        assert!(root.array("title").is_none());
        assert!(root.array("missing").is_none());
    }

    #[test]
    fn test_literal_accessors() {
        let doc = parse_document(r#"{"n": 3, "s": "x", "o": {}}"#).unwrap();
        let root = JsonNode::root(&doc);
        assert_eq!(root.number("n").unwrap().unwrap().value, 3.0);
        // Wrong literal kind reads as absent
        assert!(root.string("n").unwrap().is_none());
        assert!(root.literal("missing").unwrap().is_none());
        // Non-literal where a literal is expected is an error
        match root.literal("o") {
            Err(ParseError::NotALiteral { pointer }) => assert_eq!(pointer, "#/o"),
            other => panic!("Expected NotALiteral, got {:?}", other),
        }
    }
}
