//! Intermediate Representation
//!
//! Language-agnostic records handed to code generators. Every entity keeps
//! an opaque `loc` string (see [`encode_range`]) pointing back into the
//! source document.

use serde::{Deserialize, Serialize};

use crate::json::{encode_range, Spanned, TextRange};

/// Index of the parsed document in [`Service::source_paths`]
pub const SOURCE_INDEX: usize = 0;

/// Encode a range of the parsed document
pub fn loc(range: TextRange) -> String {
    encode_range(SOURCE_INDEX, &range)
}

// =============================================================================
// Literals
// =============================================================================

/// A value read from the source, with its location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal<T> {
    pub value: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<String>,
}

pub type StringLiteral = Literal<String>;
pub type NumberLiteral = Literal<f64>;
pub type NonNegativeIntegerLiteral = Literal<u64>;
pub type TrueLiteral = Literal<bool>;

impl<T> Literal<T> {
    pub fn new(value: T, range: Option<TextRange>) -> Self {
        Self {
            value,
            loc: range.map(loc),
        }
    }

    /// A literal synthesized by the parser rather than read from the source
    pub fn unlocated(value: T) -> Self {
        Self { value, loc: None }
    }
}

impl<T, U: Into<T>> From<Spanned<U>> for Literal<T> {
    fn from(spanned: Spanned<U>) -> Self {
        Self::new(spanned.value.into(), Some(spanned.range))
    }
}

impl TrueLiteral {
    pub fn yes(range: Option<TextRange>) -> Self {
        Self::new(true, range)
    }
}

/// Split a description into paragraphs on blank lines
pub fn to_description(text: Spanned<&str>) -> Vec<StringLiteral> {
    text.value
        .split("\n\n")
        .map(|p| StringLiteral::new(p.to_string(), Some(text.range)))
        .collect()
}

// =============================================================================
// Validation Rules
// =============================================================================

/// Constraint on a single value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "id")]
pub enum ValidationRule {
    StringMaxLength {
        length: NonNegativeIntegerLiteral,
        loc: Option<String>,
    },
    StringMinLength {
        length: NonNegativeIntegerLiteral,
        loc: Option<String>,
    },
    StringPattern {
        pattern: StringLiteral,
        loc: Option<String>,
    },
    StringFormat {
        format: StringLiteral,
        loc: Option<String>,
    },
    StringEnum {
        values: Vec<StringLiteral>,
        loc: Option<String>,
    },
    NumberMultipleOf {
        value: NumberLiteral,
        loc: Option<String>,
    },
    #[serde(rename = "NumberGT")]
    NumberGt {
        value: NumberLiteral,
        loc: Option<String>,
    },
    #[serde(rename = "NumberGTE")]
    NumberGte {
        value: NumberLiteral,
        loc: Option<String>,
    },
    #[serde(rename = "NumberLT")]
    NumberLt {
        value: NumberLiteral,
        loc: Option<String>,
    },
    #[serde(rename = "NumberLTE")]
    NumberLte {
        value: NumberLiteral,
        loc: Option<String>,
    },
    ArrayMinItems {
        min: NonNegativeIntegerLiteral,
        loc: Option<String>,
    },
    ArrayMaxItems {
        max: NonNegativeIntegerLiteral,
        loc: Option<String>,
    },
    ArrayUniqueItems {
        required: bool,
        loc: Option<String>,
    },
}

impl ValidationRule {
    /// Rule identifier as it appears in serialized output
    pub fn id(&self) -> &'static str {
        match self {
            Self::StringMaxLength { .. } => "StringMaxLength",
            Self::StringMinLength { .. } => "StringMinLength",
            Self::StringPattern { .. } => "StringPattern",
            Self::StringFormat { .. } => "StringFormat",
            Self::StringEnum { .. } => "StringEnum",
            Self::NumberMultipleOf { .. } => "NumberMultipleOf",
            Self::NumberGt { .. } => "NumberGT",
            Self::NumberGte { .. } => "NumberGTE",
            Self::NumberLt { .. } => "NumberLT",
            Self::NumberLte { .. } => "NumberLTE",
            Self::ArrayMinItems { .. } => "ArrayMinItems",
            Self::ArrayMaxItems { .. } => "ArrayMaxItems",
            Self::ArrayUniqueItems { .. } => "ArrayUniqueItems",
        }
    }
}

/// Constraint on an object as a whole
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "id")]
pub enum ObjectValidationRule {
    ObjectMinProperties {
        min: NonNegativeIntegerLiteral,
        loc: Option<String>,
    },
    ObjectMaxProperties {
        max: NonNegativeIntegerLiteral,
        loc: Option<String>,
    },
}

// =============================================================================
// Member Values
// =============================================================================

/// Fixed primitive vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Primitive {
    /// Placeholder for anything the parser cannot type
    Untyped,
    Boolean,
    Integer,
    Long,
    Number,
    Float,
    Double,
    String,
    Date,
    DateTime,
}

/// Constant from `const`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ConstantValue {
    #[serde(rename = "StringLiteral")]
    String(StringLiteral),
    #[serde(rename = "NumberLiteral")]
    Number(NumberLiteral),
    #[serde(rename = "BooleanLiteral")]
    Boolean(Literal<bool>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimitiveValue {
    pub type_name: Literal<Primitive>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_array: Option<TrueLiteral>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_optional: Option<TrueLiteral>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constant: Option<ConstantValue>,
    pub rules: Vec<ValidationRule>,
}

/// Reference to a registered Type, Enum or Union by name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexValue {
    pub type_name: StringLiteral,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_array: Option<TrueLiteral>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_optional: Option<TrueLiteral>,
    pub rules: Vec<ValidationRule>,
}

/// The shape of a property or union member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum MemberValue {
    #[serde(rename = "PrimitiveValue")]
    Primitive(PrimitiveValue),
    #[serde(rename = "ComplexValue")]
    Complex(ComplexValue),
}

impl MemberValue {
    pub fn primitive(primitive: Primitive, range: Option<TextRange>) -> Self {
        MemberValue::Primitive(PrimitiveValue {
            type_name: Literal::new(primitive, range),
            is_array: None,
            is_optional: None,
            constant: None,
            rules: Vec::new(),
        })
    }

    pub fn untyped() -> Self {
        Self::primitive(Primitive::Untyped, None)
    }

    pub fn untyped_array() -> Self {
        Self::untyped().into_array(None)
    }

    pub fn complex(type_name: StringLiteral) -> Self {
        MemberValue::Complex(ComplexValue {
            type_name,
            is_array: None,
            is_optional: None,
            rules: Vec::new(),
        })
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, MemberValue::Primitive(_))
    }

    pub fn is_untyped(&self) -> bool {
        matches!(self, MemberValue::Primitive(p) if p.type_name.value == Primitive::Untyped)
    }

    /// Name of the referenced entity for complex values
    pub fn complex_name(&self) -> Option<&str> {
        match self {
            MemberValue::Complex(c) => Some(&c.type_name.value),
            MemberValue::Primitive(_) => None,
        }
    }

    pub fn is_array(&self) -> bool {
        match self {
            MemberValue::Primitive(p) => p.is_array.is_some(),
            MemberValue::Complex(c) => c.is_array.is_some(),
        }
    }

    pub fn is_optional(&self) -> bool {
        match self {
            MemberValue::Primitive(p) => p.is_optional.is_some(),
            MemberValue::Complex(c) => c.is_optional.is_some(),
        }
    }

    pub fn rules(&self) -> &[ValidationRule] {
        match self {
            MemberValue::Primitive(p) => &p.rules,
            MemberValue::Complex(c) => &c.rules,
        }
    }

    pub fn into_array(mut self, range: Option<TextRange>) -> Self {
        let flag = Some(TrueLiteral::yes(range));
        match &mut self {
            MemberValue::Primitive(p) => p.is_array = flag,
            MemberValue::Complex(c) => c.is_array = flag,
        }
        self
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        let flag = optional.then(|| TrueLiteral::unlocated(true));
        match &mut self {
            MemberValue::Primitive(p) => p.is_optional = flag,
            MemberValue::Complex(c) => c.is_optional = flag,
        }
        self
    }

    pub fn with_rules(mut self, rules: Vec<ValidationRule>) -> Self {
        match &mut self {
            MemberValue::Primitive(p) => p.rules = rules,
            MemberValue::Complex(c) => c.rules = rules,
        }
        self
    }
}

// =============================================================================
// Entities
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: StringLiteral,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Vec<StringLiteral>>,
    pub value: MemberValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Type {
    pub name: StringLiteral,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Vec<StringLiteral>>,
    pub properties: Vec<Property>,
    pub rules: Vec<ObjectValidationRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<String>,
}

impl Type {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name.value == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumMember {
    pub content: StringLiteral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enum {
    pub name: StringLiteral,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Vec<StringLiteral>>,
    pub members: Vec<EnumMember>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<String>,
}

/// How a union's members relate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnionKind {
    /// Empty `oneOf`: nothing to classify
    #[serde(rename = "SimpleUnion")]
    Simple,
    /// Complex members selected by a tag property
    #[serde(rename = "DiscriminatedUnion")]
    Discriminated,
    /// Only primitive members
    #[serde(rename = "PrimitiveUnion")]
    Primitive,
    /// Only complex members, no tag
    #[serde(rename = "ComplexUnion")]
    Complex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Union {
    pub kind: UnionKind,
    pub name: StringLiteral,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Vec<StringLiteral>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<StringLiteral>,
    pub members: Vec<MemberValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<String>,
}

/// Method-bearing interface. This parser never produces any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub name: StringLiteral,
}

/// The complete IR for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub title: StringLiteral,
    pub major_version: Literal<u32>,
    pub source_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loc: Option<String>,
    pub interfaces: Vec<Interface>,
    pub types: Vec<Type>,
    pub enums: Vec<Enum>,
    pub unions: Vec<Union>,
}

impl Service {
    pub fn find_type(&self, name: &str) -> Option<&Type> {
        self.types.iter().find(|t| t.name.value == name)
    }

    pub fn find_enum(&self, name: &str) -> Option<&Enum> {
        self.enums.iter().find(|e| e.name.value == name)
    }

    pub fn find_union(&self, name: &str) -> Option<&Union> {
        self.unions.iter().find(|u| u.name.value == name)
    }

    /// Whether `name` refers to a registered Type, Enum or Union
    pub fn defines(&self, name: &str) -> bool {
        self.find_type(name).is_some()
            || self.find_enum(name).is_some()
            || self.find_union(name).is_some()
    }
}
