//! Diagnostics
//!
//! Violations collected while building the type graph. None of these stop
//! the walk; the builder degrades the offending shape and keeps going.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::json::TextRange;

// =============================================================================
// Violation Codes
// =============================================================================

/// Violation code for categorizing issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViolationCode {
    /// `$ref` target not found in the document
    #[serde(rename = "json-schema/unresolved-reference")]
    UnresolvedReference,
    /// `$ref` chain that loops without reaching a named entity
    #[serde(rename = "json-schema/circular-reference")]
    CircularReference,
    /// Keyword recognized but not translated
    #[serde(rename = "json-schema/unsupported-feature")]
    UnsupportedFeature,
    /// Primitive member in a discriminated union
    #[serde(rename = "json-schema/misconfigured-discriminator")]
    MisconfiguredDiscriminator,
    /// Two different schemas infer the same entity name
    #[serde(rename = "json-schema/name-collision")]
    NameCollision,
}

impl ViolationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnresolvedReference => "json-schema/unresolved-reference",
            Self::CircularReference => "json-schema/circular-reference",
            Self::UnsupportedFeature => "json-schema/unsupported-feature",
            Self::MisconfiguredDiscriminator => "json-schema/misconfigured-discriminator",
            Self::NameCollision => "json-schema/name-collision",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::UnresolvedReference
            | Self::CircularReference
            | Self::MisconfiguredDiscriminator => Severity::Error,

            Self::NameCollision => Severity::Warning,

            Self::UnsupportedFeature => Severity::Info,
        }
    }
}

impl fmt::Display for ViolationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Violation
// =============================================================================

/// A single recoverable problem in the schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub code: ViolationCode,
    pub message: String,
    pub severity: Severity,
    pub range: TextRange,
    pub source_path: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} [{}] {}",
            self.source_path,
            self.range.start.line,
            self.range.start.column,
            self.severity,
            self.code,
            self.message
        )
    }
}

// =============================================================================
// Violations Collection
// =============================================================================

/// Violations for one document, in the order they were raised
#[derive(Debug, Clone, Default)]
pub struct Violations {
    source_path: String,
    items: Vec<Violation>,
}

impl Violations {
    pub fn new(source_path: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            items: Vec::new(),
        }
    }

    /// Record a violation; severity follows from the code. The same problem
    /// at the same range is only recorded once.
    pub fn push(&mut self, code: ViolationCode, range: TextRange, message: impl Into<String>) {
        let violation = Violation {
            code,
            message: message.into(),
            severity: code.severity(),
            range,
            source_path: self.source_path.clone(),
        };
        if !self.items.contains(&violation) {
            self.items.push(violation);
        }
    }

    pub fn unresolved_reference(&mut self, range: TextRange, target: &str) {
        self.push(
            ViolationCode::UnresolvedReference,
            range,
            format!("Cannot resolve reference '{}'", target),
        );
    }

    pub fn circular_reference(&mut self, range: TextRange, chain: &[String]) {
        self.push(
            ViolationCode::CircularReference,
            range,
            format!("Circular reference: {}", chain.join(" -> ")),
        );
    }

    pub fn unsupported(&mut self, range: TextRange, feature: &str) {
        self.push(
            ViolationCode::UnsupportedFeature,
            range,
            format!("{} is not yet supported", feature),
        );
    }

    pub fn misconfigured_discriminator(&mut self, range: TextRange, property: &str, member: &str) {
        self.push(
            ViolationCode::MisconfiguredDiscriminator,
            range,
            format!(
                "Discriminator '{}' may not reference primitive types; dropping {}",
                property, member
            ),
        );
    }

    pub fn name_collision(&mut self, range: TextRange, name: &str, first: &str, second: &str) {
        self.push(
            ViolationCode::NameCollision,
            range,
            format!(
                "Name '{}' is already used by {}; ignoring the definition at {}",
                name, first, second
            ),
        );
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(|v| v.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.items.iter().filter(|v| v.severity == Severity::Error)
    }

    pub fn all(&self) -> &[Violation] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<Violation> {
        self.items
    }
}
