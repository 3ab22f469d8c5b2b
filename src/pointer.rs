//! Pointer Resolution
//!
//! Resolves `$ref` and parent pointers against the document root, infers
//! names for anonymous schemas from their position, and decides whether a
//! property is required by looking at the schema that declares it.

use crate::error::Result;
use crate::json::{unescape_segment, Identifier, JsonNode, Node, NodeKind, TextRange};
use crate::schema::SchemaNode;

/// A name for a registered entity, with the range it was read from (if any)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    pub value: String,
    /// `title` or definition key range; `None` for structurally derived names
    pub range: Option<TextRange>,
}

impl TypeName {
    pub fn new(value: impl Into<String>, range: Option<TextRange>) -> Self {
        Self {
            value: value.into(),
            range,
        }
    }
}

/// Pointer lookups over one document
#[derive(Debug, Clone)]
pub struct PointerResolver<'a> {
    root: &'a Node,
    /// Name used for the document root when it has no `title`
    root_type_name: String,
}

impl<'a> PointerResolver<'a> {
    pub fn new(root: &'a Node, root_type_name: impl Into<String>) -> Self {
        Self {
            root,
            root_type_name: root_type_name.into(),
        }
    }

    pub fn root(&self) -> SchemaNode<'a> {
        SchemaNode::from(JsonNode::root(self.root))
    }

    /// Walk `#/a/b/0` from the root. `None` if any segment is missing or the
    /// pointer is not rooted at `#`.
    pub fn resolve(&self, pointer: &str) -> Option<JsonNode<'a>> {
        let mut segments = pointer.split('/');
        if segments.next() != Some("#") {
            return None;
        }

        let mut cursor = self.root;
        for segment in segments {
            cursor = match &cursor.kind {
                NodeKind::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                NodeKind::Object(_) => &cursor.property(&unescape_segment(segment))?.value,
                NodeKind::Literal(_) => return None,
            };
        }

        Some(JsonNode::new(cursor, pointer))
    }

    pub fn resolve_schema(&self, pointer: &str) -> Option<SchemaNode<'a>> {
        self.resolve(pointer).map(SchemaNode::from)
    }

    /// The last object key walked along `pointer`
    pub fn key_name(&self, pointer: &str) -> Option<&'a Identifier> {
        let mut segments = pointer.split('/');
        if segments.next() != Some("#") {
            return None;
        }

        let mut name = None;
        let mut cursor = self.root;
        for segment in segments {
            cursor = match &cursor.kind {
                NodeKind::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                NodeKind::Object(_) => {
                    let prop = cursor.property(&unescape_segment(segment))?;
                    name = Some(&prop.key);
                    &prop.value
                }
                NodeKind::Literal(_) => return None,
            };
        }

        name
    }

    /// Name for the schema at this position.
    ///
    /// `title` wins; a `definitions`/`$defs` entry is named by its key;
    /// anything else is `<ancestor>_<segment>` where the ancestor skips
    /// `items` (one segment) or a keyword plus key (two segments).
    pub fn infer_type_name(&self, schema: &SchemaNode<'a>) -> TypeName {
        self.infer_name_at(schema.json())
    }

    fn infer_name_at(&self, node: &JsonNode<'a>) -> TypeName {
        // A malformed title just falls back to the structural name
        if let Ok(Some(title)) = node.string("title") {
            return TypeName::new(title.value, Some(title.range));
        }

        let segments: Vec<&str> = node.pointer().split('/').collect();
        let n = segments.len();
        if n < 2 {
            return TypeName::new(self.root_type_name.clone(), None);
        }

        let last = segments[n - 1];
        let penultimate = segments[n - 2];

        if penultimate == "definitions" || penultimate == "$defs" {
            if let Some(key) = self.key_name(node.pointer()) {
                return TypeName::new(key.value.clone(), Some(key.range));
            }
        }

        let keep = if last == "items" && penultimate != "properties" {
            n - 1
        } else {
            n - 2
        };

        let local = unescape_segment(last);
        let ancestor = match keep {
            0 => None,
            _ => self.resolve(&segments[..keep].join("/")),
        };

        match ancestor.map(|a| self.infer_name_at(&a)) {
            Some(parent) if !parent.value.is_empty() => {
                TypeName::new(format!("{}_{}", parent.value, local), None)
            }
            _ => TypeName::new(local, None),
        }
    }

    /// True iff this schema sits under `properties` and the declaring
    /// schema's `required` lists its key
    pub fn is_required(&self, schema: &SchemaNode<'a>) -> Result<bool> {
        let parts: Vec<&str> = schema.pointer().rsplitn(3, '/').collect();
        let [key, penultimate, parent] = parts.as_slice() else {
            return Ok(false);
        };
        if *penultimate != "properties" {
            return Ok(false);
        }

        let Some(parent) = self.resolve_schema(parent) else {
            return Ok(false);
        };

        let key = unescape_segment(key);
        Ok(parent
            .required()?
            .map(|required| required.iter().any(|r| r.value.as_str() == Some(key.as_str())))
            .unwrap_or(false))
    }
}
