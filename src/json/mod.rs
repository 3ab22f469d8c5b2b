//! Structural Layer
//!
//! A JSON tree where every node remembers where it came from. The parser
//! builds the tree once; [`JsonNode`] is a cheap view over it that knows its
//! JSON Pointer and exposes child-by-key, array-of-children and typed
//! literal accessors.

pub mod node;
pub mod parser;

pub use node::{JsonNode, LiteralNode};
pub use parser::parse_document;

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Source Positions
// =============================================================================

/// A point in the source text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-indexed)
    pub line: u32,
    /// Column number (1-indexed)
    pub column: u32,
    /// Byte offset from start of source
    pub offset: usize,
}

/// Source range covered by a node (end is exclusive)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRange {
    pub start: Position,
    pub end: Position,
}

impl TextRange {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Length of the range in bytes
    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for TextRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}

/// Encode a range as an opaque string: `"source;line;col;offset;line;col;offset"`.
///
/// IR entities carry their location in this form so they stay plain strings
/// in serialized output.
pub fn encode_range(source_index: usize, range: &TextRange) -> String {
    format!(
        "{};{};{};{};{};{};{}",
        source_index,
        range.start.line,
        range.start.column,
        range.start.offset,
        range.end.line,
        range.end.column,
        range.end.offset
    )
}

/// Inverse of [`encode_range`]
pub fn decode_range(encoded: &str) -> Option<(TextRange, usize)> {
    let parts: Vec<&str> = encoded.split(';').collect();
    let [source, sl, sc, so, el, ec, eo] = parts.as_slice() else {
        return None;
    };

    let range = TextRange {
        start: Position {
            line: sl.parse().ok()?,
            column: sc.parse().ok()?,
            offset: so.parse().ok()?,
        },
        end: Position {
            line: el.parse().ok()?,
            column: ec.parse().ok()?,
            offset: eo.parse().ok()?,
        },
    };

    Some((range, source.parse().ok()?))
}

// =============================================================================
// Tree
// =============================================================================

/// A parsed JSON value with its source range
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub range: TextRange,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Object members in source order
    Object(Vec<Property>),
    Array(Vec<Node>),
    Literal(Literal),
}

/// An object member: `"key": value`
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: Identifier,
    pub value: Node,
    /// Covers the key through the end of the value
    pub range: TextRange,
}

/// An object key
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub value: String,
    pub range: TextRange,
}

/// Scalar JSON value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl Literal {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Literal::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl Node {
    pub fn as_object(&self) -> Option<&[Property]> {
        match &self.kind {
            NodeKind::Object(props) => Some(props),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Node]> {
        match &self.kind {
            NodeKind::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.kind {
            NodeKind::Literal(lit) => Some(lit),
            _ => None,
        }
    }

    /// First member with the given key. Duplicate keys resolve to the first occurrence.
    pub fn property(&self, key: &str) -> Option<&Property> {
        self.as_object()?.iter().find(|p| p.key.value == key)
    }
}

/// A value paired with the range it was read from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub range: TextRange,
}

impl<T> Spanned<T> {
    pub fn new(value: T, range: TextRange) -> Self {
        Self { value, range }
    }
}

// =============================================================================
// JSON Pointer Segments
// =============================================================================

/// Escape a key for use as a pointer segment (`~` → `~0`, `/` → `~1`)
pub fn escape_segment(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

/// Undo [`escape_segment`]
pub fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}
