//! Type Graph Builder
//!
//! Walks the schema tree from the document root and accumulates the Type,
//! Enum and Union registries plus a violation list. All mutable state lives
//! in a [`BuildContext`] threaded through every recursive call.
//!
//! Named shapes (objects, intersections, string enums, `oneOf` unions) claim
//! their pointer and name before their children are walked. Revisiting a
//! claimed pointer yields a reference without walking it again, which is
//! what keeps recursive schemas finite and every reference resolvable.

pub mod diagnostics;
pub mod patterns;

pub use diagnostics::{Severity, Violation, ViolationCode, Violations};
pub use patterns::{detect_kind, primitive_for, SchemaKind};

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::config::{ParserOptions, TupleItemsPolicy};
use crate::error::{ParseError, Result};
use crate::ir::{
    loc, to_description, ConstantValue, Enum, EnumMember, Literal, MemberValue, NumberLiteral,
    Property, StringLiteral, Type, Union, UnionKind,
};
use crate::json::{JsonNode, Literal as JsonLiteral, Spanned, TextRange};
use crate::pointer::PointerResolver;
use crate::rules::{parse_object_validation_rules, parse_validation_rules};
use crate::schema::{Items, SchemaNode, SchemaRecordItem, TypeKeyword};

// =============================================================================
// Build Context
// =============================================================================

/// Registries and bookkeeping for one parse
#[derive(Debug)]
pub struct BuildContext {
    pub types: IndexMap<String, Type>,
    pub enums: IndexMap<String, Enum>,
    pub unions: IndexMap<String, Union>,
    pub violations: Violations,
    /// Pointer of a named shape -> the name references to it use
    claimed: HashMap<String, String>,
    /// Name -> pointer of the shape that owns it
    owners: HashMap<String, String>,
    /// `$ref` targets on the current descent
    ref_chain: Vec<String>,
    /// `definitions`/`$defs` records already expanded
    expanded: HashSet<String>,
    /// Duplicates seen while their name's owner was still being built
    deferred: Vec<DeferredCollision>,
}

/// A duplicate name to compare once the owning entity is registered
#[derive(Debug)]
struct DeferredCollision {
    name: String,
    owner: String,
    pointer: String,
    range: TextRange,
    fingerprint: serde_json::Value,
}

impl BuildContext {
    pub fn new(source_path: impl Into<String>) -> Self {
        Self {
            types: IndexMap::new(),
            enums: IndexMap::new(),
            unions: IndexMap::new(),
            violations: Violations::new(source_path),
            claimed: HashMap::new(),
            owners: HashMap::new(),
            ref_chain: Vec::new(),
            expanded: HashSet::new(),
            deferred: Vec::new(),
        }
    }

    /// Name a schema location; the first pointer to use a name owns it
    fn claim(&mut self, pointer: &str, name: &str) {
        self.claimed.insert(pointer.to_string(), name.to_string());
        self.owners
            .entry(name.to_string())
            .or_insert_with(|| pointer.to_string());
    }

    fn fingerprint_of(&self, name: &str) -> Result<Option<serde_json::Value>> {
        if let Some(t) = self.types.get(name) {
            return fingerprint(t).map(Some);
        }
        if let Some(e) = self.enums.get(name) {
            return fingerprint(e).map(Some);
        }
        if let Some(u) = self.unions.get(name) {
            return fingerprint(u).map(Some);
        }
        Ok(None)
    }

    /// Compare deferred duplicates against the entities that now own their names
    fn settle_collisions(&mut self) -> Result<()> {
        for deferred in std::mem::take(&mut self.deferred) {
            if self.fingerprint_of(&deferred.name)?.as_ref() != Some(&deferred.fingerprint) {
                self.violations.name_collision(
                    deferred.range,
                    &deferred.name,
                    &deferred.owner,
                    &deferred.pointer,
                );
            }
        }
        Ok(())
    }
}

/// A registered entity awaiting insertion
enum Entity {
    Type(Type),
    Enum(Enum),
    Union(Union),
}

impl Entity {
    fn fingerprint(&self) -> Result<serde_json::Value> {
        match self {
            Entity::Type(t) => fingerprint(t),
            Entity::Enum(e) => fingerprint(e),
            Entity::Union(u) => fingerprint(u),
        }
    }
}

/// Serialized form with every `loc` removed, for structural comparison
fn fingerprint(entity: &impl Serialize) -> Result<serde_json::Value> {
    fn strip(value: &mut serde_json::Value) {
        match value {
            serde_json::Value::Object(map) => {
                map.remove("loc");
                map.values_mut().for_each(strip);
            }
            serde_json::Value::Array(items) => items.iter_mut().for_each(strip),
            _ => {}
        }
    }

    let mut value = serde_json::to_value(entity)?;
    strip(&mut value);
    Ok(value)
}

// =============================================================================
// Builder
// =============================================================================

/// Result of visiting one schema
#[derive(Debug, Clone)]
pub struct Visited {
    pub value: MemberValue,
    /// Description a property may inherit when it has none of its own
    pub description: Option<Vec<StringLiteral>>,
}

impl Visited {
    fn new(value: MemberValue, description: Option<Vec<StringLiteral>>) -> Self {
        Self { value, description }
    }
}

/// Recursive shape dispatcher over one document
pub struct TypeGraphBuilder<'a> {
    resolver: PointerResolver<'a>,
    tuple_items: TupleItemsPolicy,
}

impl<'a> TypeGraphBuilder<'a> {
    pub fn new(resolver: PointerResolver<'a>, options: &ParserOptions) -> Self {
        Self {
            resolver,
            tuple_items: options.tuple_items,
        }
    }

    pub fn resolver(&self) -> &PointerResolver<'a> {
        &self.resolver
    }

    /// Visit the document root
    pub fn build(&self, ctx: &mut BuildContext) -> Result<Visited> {
        let root = self.resolver.root();
        let visited = self.visit(ctx, &root, root.range())?;
        ctx.settle_collisions()?;
        Ok(visited)
    }

    /// Transform `schema` into a value shape. `range` is where the schema is
    /// used (a property member, a union member) and becomes the entity loc.
    pub fn visit(
        &self,
        ctx: &mut BuildContext,
        schema: &SchemaNode<'a>,
        range: TextRange,
    ) -> Result<Visited> {
        self.visit_definitions(ctx, schema)?;

        let description = schema.description()?.map(to_description);

        if let Some(name) = ctx.claimed.get(schema.pointer()) {
            return Ok(Visited::new(
                MemberValue::complex(StringLiteral::unlocated(name.clone())),
                description,
            ));
        }

        let kind = detect_kind(schema)?;
        debug!(pointer = schema.pointer(), kind = kind.name(), "visiting schema");

        let value = match kind {
            SchemaKind::Ref(target) => return self.visit_ref(ctx, target, range, description),
            SchemaKind::Intersection(members) => {
                self.visit_intersection(ctx, schema, &members, range)?
            }
            SchemaKind::AnyOf => {
                let at = schema.property_range("anyOf").unwrap_or(schema.range());
                ctx.violations.unsupported(at, "anyOf");
                MemberValue::untyped()
            }
            SchemaKind::OneOf(members) => self.visit_one_of(ctx, schema, &members, range)?,
            SchemaKind::TypeArray => {
                let at = schema.property_range("type").unwrap_or(schema.range());
                ctx.violations.unsupported(at, "An array of types");
                MemberValue::untyped()
            }
            SchemaKind::Enum(entries) => self.visit_enum(ctx, schema, &entries, range)?,
            SchemaKind::Object => self.visit_object(ctx, schema, range)?,
            SchemaKind::Array(items) => self.visit_array(ctx, schema, items)?,
            SchemaKind::Primitive => self.visit_primitive(schema, range)?,
        };

        Ok(Visited::new(value, description))
    }

    /// Every `definitions`/`$defs` entry is visited once, referenced or not
    fn visit_definitions(&self, ctx: &mut BuildContext, schema: &SchemaNode<'a>) -> Result<()> {
        let Some(definitions) = schema.definitions() else {
            return Ok(());
        };
        if !ctx.expanded.insert(definitions.pointer().to_string()) {
            return Ok(());
        }

        for child in definitions.children() {
            self.visit(ctx, &child.value, child.range)?;
        }
        Ok(())
    }

    fn visit_ref(
        &self,
        ctx: &mut BuildContext,
        target: Spanned<&'a str>,
        range: TextRange,
        description: Option<Vec<StringLiteral>>,
    ) -> Result<Visited> {
        let Some(resolved) = self.resolver.resolve_schema(target.value) else {
            ctx.violations.unresolved_reference(target.range, target.value);
            return Ok(Visited::new(MemberValue::untyped(), description));
        };

        let pointer = resolved.pointer().to_string();
        if ctx.ref_chain.contains(&pointer) && !ctx.claimed.contains_key(&pointer) {
            let mut chain = ctx.ref_chain.clone();
            chain.push(pointer);
            ctx.violations.circular_reference(target.range, &chain);
            return Ok(Visited::new(MemberValue::untyped(), description));
        }

        ctx.ref_chain.push(pointer);
        let visited = self.visit(ctx, &resolved, range);
        ctx.ref_chain.pop();

        let mut visited = visited?;
        if description.is_some() {
            visited.description = description;
        }
        Ok(visited)
    }

    fn visit_intersection(
        &self,
        ctx: &mut BuildContext,
        schema: &SchemaNode<'a>,
        members: &[SchemaNode<'a>],
        range: TextRange,
    ) -> Result<MemberValue> {
        let name = self.claim(ctx, schema);

        let mut properties: IndexMap<String, Property> = IndexMap::new();
        let mut rules = Vec::new();

        for member in members {
            let object = match member.reference()? {
                Some(target) => match self.resolver.resolve_schema(target.value) {
                    Some(resolved) => resolved,
                    None => {
                        ctx.violations.unresolved_reference(target.range, target.value);
                        continue;
                    }
                },
                None => member.clone(),
            };

            if !object.is_object_type()? {
                continue;
            }

            for child in object.properties().map(|p| p.children()).unwrap_or_default() {
                if child.key.value.starts_with('$') {
                    continue;
                }
                let property = self.visit_property(ctx, &child)?;
                properties.insert(child.key.value.to_string(), property);
            }
            rules.extend(parse_object_validation_rules(&object)?);
        }

        let entity = Type {
            name: name.clone(),
            description: schema.description()?.map(to_description),
            properties: properties.into_values().collect(),
            rules,
            loc: Some(loc(range)),
        };
        self.register(ctx, schema.pointer(), range, Entity::Type(entity))?;

        Ok(MemberValue::complex(name))
    }

    fn visit_one_of(
        &self,
        ctx: &mut BuildContext,
        schema: &SchemaNode<'a>,
        members: &[SchemaNode<'a>],
        range: TextRange,
    ) -> Result<MemberValue> {
        let discriminator = schema.discriminator();
        let property_name = match &discriminator {
            Some(d) => d.property_name()?,
            None => None,
        };

        // Mixed members are rejected before a name is handed out
        if property_name.is_none() {
            let mut chain = ctx.ref_chain.clone();
            let mut pending = vec![schema.pointer().to_string()];
            if self.is_mixed(ctx, members, &mut chain, &mut pending)? {
                let at = schema.property_range("oneOf").unwrap_or(schema.range());
                ctx.violations.unsupported(at, "Mixing primitive and complex oneOf members");
                return Ok(MemberValue::untyped());
            }
        }

        let name = self.claim(ctx, schema);

        let mut values = Vec::with_capacity(members.len());
        for member in members {
            values.push(self.visit(ctx, member, member.range())?.value);
        }

        let description = schema.description()?.map(to_description);

        let union = match (discriminator, property_name) {
            (Some(discriminator), Some(property_name)) => {
                if let Some(mapping) = discriminator.mapping() {
                    ctx.violations.push(
                        ViolationCode::UnsupportedFeature,
                        mapping.range(),
                        "Discriminator mapping is not yet supported and will have no effect",
                    );
                }

                let mut complex = Vec::with_capacity(values.len());
                for (member, value) in members.iter().zip(values) {
                    if value.is_primitive() {
                        ctx.violations.misconfigured_discriminator(
                            discriminator.range(),
                            property_name.value,
                            member.pointer(),
                        );
                    } else {
                        complex.push(value);
                    }
                }

                Union {
                    kind: UnionKind::Discriminated,
                    name: name.clone(),
                    description,
                    discriminator: Some(StringLiteral::from(property_name)),
                    members: complex,
                    loc: Some(loc(range)),
                }
            }
            _ => {
                let kind = if values.is_empty() {
                    UnionKind::Simple
                } else if values.iter().all(MemberValue::is_primitive) {
                    UnionKind::Primitive
                } else {
                    UnionKind::Complex
                };

                // Claimed unions always register; stray primitives are dropped
                let mut members = values;
                if kind == UnionKind::Complex && members.iter().any(MemberValue::is_primitive) {
                    members.retain(|v| !v.is_primitive());
                    let at = schema.property_range("oneOf").unwrap_or(schema.range());
                    ctx.violations.unsupported(at, "Mixing primitive and complex oneOf members");
                }

                Union {
                    kind,
                    name: name.clone(),
                    description,
                    discriminator: None,
                    members,
                    loc: Some(loc(range)),
                }
            }
        };

        self.register(ctx, schema.pointer(), range, Entity::Union(union))?;
        Ok(MemberValue::complex(name))
    }

    /// True when some members would visit as primitives and others as
    /// references. Nothing is claimed or registered.
    fn is_mixed(
        &self,
        ctx: &BuildContext,
        members: &[SchemaNode<'a>],
        chain: &mut Vec<String>,
        pending: &mut Vec<String>,
    ) -> Result<bool> {
        let mut primitive = false;
        let mut complex = false;
        for member in members {
            if self.visits_as_primitive(ctx, member, chain, pending)? {
                primitive = true;
            } else {
                complex = true;
            }
        }
        Ok(primitive && complex)
    }

    /// Predict whether visiting `schema` yields a primitive value.
    ///
    /// `chain` mirrors the `$ref` chain of a real descent; `pending` holds the
    /// `oneOf` nodes being classified, which would be claimed by the time a
    /// member refers back to them.
    fn visits_as_primitive(
        &self,
        ctx: &BuildContext,
        schema: &SchemaNode<'a>,
        chain: &mut Vec<String>,
        pending: &mut Vec<String>,
    ) -> Result<bool> {
        let pointer = schema.pointer().to_string();
        if ctx.claimed.contains_key(&pointer) || pending.contains(&pointer) {
            return Ok(false);
        }

        Ok(match detect_kind(schema)? {
            SchemaKind::Ref(target) => {
                let Some(resolved) = self.resolver.resolve_schema(target.value) else {
                    return Ok(true);
                };
                let target = resolved.pointer().to_string();
                if ctx.claimed.contains_key(&target) || pending.contains(&target) {
                    return Ok(false);
                }
                if chain.contains(&target) {
                    return Ok(true);
                }
                chain.push(target);
                let primitive = self.visits_as_primitive(ctx, &resolved, chain, pending);
                chain.pop();
                primitive?
            }
            SchemaKind::Intersection(_) | SchemaKind::Object => false,
            SchemaKind::OneOf(members) => {
                let discriminated = match schema.discriminator() {
                    Some(d) => d.property_name()?.is_some(),
                    None => false,
                };
                if discriminated {
                    false
                } else {
                    pending.push(pointer);
                    let mixed = self.is_mixed(ctx, &members, chain, pending);
                    pending.pop();
                    mixed?
                }
            }
            SchemaKind::Enum(entries) => {
                let declared = match schema.schema_type()? {
                    None => None,
                    Some(TypeKeyword::Single(t)) => Some(t.value),
                    Some(TypeKeyword::Multiple(_)) => Some(""),
                };
                let has_strings = entries
                    .iter()
                    .any(|e| matches!(e.node().as_literal(), Some(JsonLiteral::String(_))));
                !(matches!(declared, None | Some("string")) && has_strings)
            }
            SchemaKind::Array(Some(Items::Single(item))) => {
                self.visits_as_primitive(ctx, &item, chain, pending)?
            }
            SchemaKind::Array(_)
            | SchemaKind::AnyOf
            | SchemaKind::TypeArray
            | SchemaKind::Primitive => true,
        })
    }

    fn visit_enum(
        &self,
        ctx: &mut BuildContext,
        schema: &SchemaNode<'a>,
        entries: &[JsonNode<'a>],
        range: TextRange,
    ) -> Result<MemberValue> {
        let declared = match schema.schema_type()? {
            None => None,
            Some(TypeKeyword::Single(t)) => Some(t.value),
            Some(TypeKeyword::Multiple(_)) => Some(""),
        };

        let members: Vec<EnumMember> = entries
            .iter()
            .filter_map(|entry| match entry.node().as_literal() {
                Some(JsonLiteral::String(s)) => Some(EnumMember {
                    content: StringLiteral::new(s.clone(), Some(entry.range())),
                }),
                _ => None,
            })
            .collect();

        if !matches!(declared, None | Some("string")) || members.is_empty() {
            let at = schema.property_range("enum").unwrap_or(schema.range());
            ctx.violations.unsupported(at, "An enum without string members");
            return self.visit_primitive(schema, range);
        }

        let name = self.claim(ctx, schema);
        let entity = Enum {
            name: name.clone(),
            description: schema.description()?.map(to_description),
            members,
            loc: Some(loc(range)),
        };
        self.register(ctx, schema.pointer(), range, Entity::Enum(entity))?;

        Ok(MemberValue::complex(name))
    }

    fn visit_object(
        &self,
        ctx: &mut BuildContext,
        schema: &SchemaNode<'a>,
        range: TextRange,
    ) -> Result<MemberValue> {
        let name = self.claim(ctx, schema);

        let mut properties = Vec::new();
        for child in schema.properties().map(|p| p.children()).unwrap_or_default() {
            if child.key.value.starts_with('$') {
                continue;
            }
            properties.push(self.visit_property(ctx, &child)?);
        }

        let entity = Type {
            name: name.clone(),
            description: schema.description()?.map(to_description),
            properties,
            rules: parse_object_validation_rules(schema)?,
            loc: Some(loc(range)),
        };
        self.register(ctx, schema.pointer(), range, Entity::Type(entity))?;

        Ok(MemberValue::complex(name))
    }

    fn visit_array(
        &self,
        ctx: &mut BuildContext,
        schema: &SchemaNode<'a>,
        items: Option<Items<'a>>,
    ) -> Result<MemberValue> {
        let type_range = schema.json().child("type").map(|t| t.range());

        match items {
            Some(Items::Single(item)) => {
                let visited = self.visit(ctx, &item, item.range())?;
                Ok(visited.value.into_array(type_range))
            }
            Some(Items::Tuple(_)) => match self.tuple_items {
                TupleItemsPolicy::Abort => Err(ParseError::UnsupportedTupleItems {
                    pointer: schema.pointer().to_string(),
                }),
                TupleItemsPolicy::Untyped => {
                    let at = schema.property_range("items").unwrap_or(schema.range());
                    ctx.violations.unsupported(at, "Tuple-style items");
                    Ok(MemberValue::untyped_array())
                }
            },
            None => Ok(MemberValue::untyped().into_array(type_range)),
        }
    }

    fn visit_primitive(&self, schema: &SchemaNode<'a>, range: TextRange) -> Result<MemberValue> {
        let format = schema.format()?.map(|f| f.value);
        match primitive_for(schema.simple_type()?, format) {
            Some(primitive) => Ok(MemberValue::primitive(primitive, Some(range))
                .with_rules(parse_validation_rules(schema)?)),
            None => Ok(MemberValue::untyped()),
        }
    }

    fn visit_property(
        &self,
        ctx: &mut BuildContext,
        child: &SchemaRecordItem<'a>,
    ) -> Result<Property> {
        let visited = self.visit(ctx, &child.value, child.range)?;

        let description = match child.value.description()? {
            Some(own) => Some(to_description(own)),
            None if visited.value.is_primitive() => visited.description,
            None => None,
        };

        let optional = !self.resolver.is_required(&child.value)?;
        let mut value = visited
            .value
            .with_optional(optional)
            .with_rules(parse_validation_rules(&child.value)?);

        if let MemberValue::Primitive(primitive) = &mut value {
            primitive.constant = constant_of(&child.value)?;
        }

        Ok(Property {
            name: StringLiteral::from(child.key),
            description,
            value,
            loc: Some(loc(child.range)),
        })
    }

    // --- Registration ---

    fn claim(&self, ctx: &mut BuildContext, schema: &SchemaNode<'a>) -> StringLiteral {
        let name = self.resolver.infer_type_name(schema);
        ctx.claim(schema.pointer(), &name.value);
        StringLiteral::new(name.value, name.range)
    }

    /// Insert under the claimed name. A name owned by another pointer is
    /// kept as is; a structurally different entity raises a collision, once
    /// the owner itself is registered.
    fn register(
        &self,
        ctx: &mut BuildContext,
        pointer: &str,
        range: TextRange,
        entity: Entity,
    ) -> Result<()> {
        let name = match &entity {
            Entity::Type(t) => t.name.value.clone(),
            Entity::Enum(e) => e.name.value.clone(),
            Entity::Union(u) => u.name.value.clone(),
        };

        let owner = ctx
            .owners
            .get(&name)
            .filter(|owner| owner.as_str() != pointer)
            .cloned();
        let Some(owner) = owner else {
            debug!(name = %name, pointer, "registered");
            ctx.owners.insert(name.clone(), pointer.to_string());
            match entity {
                Entity::Type(t) => {
                    ctx.types.insert(name, t);
                }
                Entity::Enum(e) => {
                    ctx.enums.insert(name, e);
                }
                Entity::Union(u) => {
                    ctx.unions.insert(name, u);
                }
            }
            return Ok(());
        };

        let fingerprint = entity.fingerprint()?;
        match ctx.fingerprint_of(&name)? {
            Some(existing) if existing == fingerprint => {}
            Some(_) => ctx.violations.name_collision(range, &name, &owner, pointer),
            None => ctx.deferred.push(DeferredCollision {
                name,
                owner,
                pointer: pointer.to_string(),
                range,
                fingerprint,
            }),
        }
        Ok(())
    }
}

/// `const` on a property, when it is a string, number or boolean
fn constant_of(schema: &SchemaNode<'_>) -> Result<Option<ConstantValue>> {
    let Some(constant) = schema.constant()? else {
        return Ok(None);
    };

    let range = Some(constant.range);
    Ok(match constant.value {
        JsonLiteral::String(s) => Some(ConstantValue::String(StringLiteral::new(s.clone(), range))),
        JsonLiteral::Number(n) => Some(ConstantValue::Number(NumberLiteral::new(*n, range))),
        JsonLiteral::Bool(b) => Some(ConstantValue::Boolean(Literal::new(*b, range))),
        JsonLiteral::Null => None,
    })
}
