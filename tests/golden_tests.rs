//! Golden Tests for Schema Transformation
//!
//! Runs whole documents through the parser and checks the resulting IR.

use std::collections::HashSet;

use jsonschema_ir::ir::{MemberValue, Primitive, UnionKind, ValidationRule};
use jsonschema_ir::json::decode_range;
use jsonschema_ir::{
    parse, parse_with_options, ParseError, ParseOutput, ParserOptions, Service, Severity,
    TupleItemsPolicy, ViolationCode,
};

fn parse_fixture(source: &str) -> ParseOutput {
    parse(source, "schema.json").unwrap()
}

fn codes(output: &ParseOutput) -> Vec<ViolationCode> {
    output.violations.iter().map(|v| v.code).collect()
}

/// Every complex reference in a property or union member names a registered entity
fn assert_referential_closure(service: &Service) {
    let property_refs = service
        .types
        .iter()
        .flat_map(|t| t.properties.iter())
        .filter_map(|p| p.value.complex_name());
    let member_refs = service
        .unions
        .iter()
        .flat_map(|u| u.members.iter())
        .filter_map(MemberValue::complex_name);

    for name in property_refs.chain(member_refs) {
        assert!(service.defines(name), "Dangling reference to '{}'", name);
    }
}

fn assert_unique_names(service: &Service) {
    let mut seen = HashSet::new();
    let names = service
        .types
        .iter()
        .map(|t| &t.name.value)
        .chain(service.enums.iter().map(|e| &e.name.value));
    for name in names {
        assert!(seen.insert(name.clone()), "Duplicate name '{}'", name);
    }
}

// =============================================================================
// Objects and Properties
// =============================================================================

#[test]
fn test_widget_definition() {
    let output = parse_fixture(include_str!("fixtures/widget.json"));
    let service = &output.service;

    assert_eq!(service.title.value, "Root");
    assert_eq!(service.types.len(), 1);
    assert!(output.violations.is_empty());

    let widget = service.find_type("Widget").unwrap();
    assert!(widget.rules.is_empty());
    assert_eq!(widget.properties.len(), 1);

    let id = &widget.properties[0];
    assert_eq!(id.name.value, "id");
    assert!(!id.value.is_optional());
    assert!(id.value.rules().is_empty());
    match &id.value {
        MemberValue::Primitive(p) => assert_eq!(p.type_name.value, Primitive::String),
        other => panic!("Expected string primitive, got {:?}", other),
    }
}

#[test]
fn test_petstore_names_and_rules() {
    let output = parse_fixture(include_str!("fixtures/petstore.json"));
    let service = &output.service;

    assert!(output.violations.is_empty(), "{:?}", output.violations);
    assert_eq!(service.title.value, "Petstore");

    let names: Vec<&str> = service.types.iter().map(|t| t.name.value.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Pet_tags_items",
            "Pet",
            "Unused",
            "Petstore_owner_address",
            "Petstore_owner",
            "Petstore",
        ]
    );

    let status = service.find_enum("Status").unwrap();
    let members: Vec<&str> = status.members.iter().map(|m| m.content.value.as_str()).collect();
    assert_eq!(members, vec!["available", "pending", "sold"]);

    let root = service.find_type("Petstore").unwrap();
    assert!(root.property("$comment").is_none());

    let pets = root.property("pets").unwrap();
    assert_eq!(pets.value.complex_name(), Some("Pet"));
    assert!(pets.value.is_array());
    assert!(!pets.value.is_optional());
    let ids: Vec<&str> = pets.value.rules().iter().map(|r| r.id()).collect();
    assert_eq!(ids, vec!["ArrayMinItems", "ArrayUniqueItems"]);

    let owner = service.find_type("Petstore_owner").unwrap();
    let name = owner.property("name").unwrap();
    assert_eq!(name.value.rules().len(), 2);
    assert!(name.value.rules().iter().any(|r| matches!(
        r,
        ValidationRule::StringMinLength { length, .. } if length.value == 1
    )));
    assert!(name.value.rules().iter().any(|r| matches!(
        r,
        ValidationRule::StringMaxLength { length, .. } if length.value == 10
    )));

    let pet = service.find_type("Pet").unwrap();
    assert_eq!(pet.property("status").unwrap().value.complex_name(), Some("Status"));
    assert_eq!(
        pet.property("tags").unwrap().value.complex_name(),
        Some("Pet_tags_items")
    );
    assert!(pet.property("nickname").unwrap().value.is_untyped());
    match &pet.property("weight").unwrap().value {
        MemberValue::Primitive(p) => assert_eq!(p.type_name.value, Primitive::Float),
        other => panic!("Expected float, got {:?}", other),
    }

    assert_referential_closure(service);
    assert_unique_names(service);
}

#[test]
fn test_locations_decode() {
    let source = include_str!("fixtures/widget.json");
    let output = parse_fixture(source);
    let widget = output.service.find_type("Widget").unwrap();

    let (range, index) = decode_range(widget.loc.as_deref().unwrap()).unwrap();
    assert_eq!(index, 0);
    assert!(source[range.start.offset..range.end.offset].starts_with("\"Widget\""));
    assert_eq!(output.service.source_paths, vec!["schema.json".to_string()]);
}

#[test]
fn test_serialized_shape() {
    let output = parse_fixture(include_str!("fixtures/widget.json"));
    let json = serde_json::to_value(&output).unwrap();

    assert_eq!(json["service"]["majorVersion"]["value"], 0);
    assert_eq!(json["service"]["interfaces"], serde_json::json!([]));
    let id = &json["service"]["types"][0]["properties"][0];
    assert_eq!(id["value"]["kind"], "PrimitiveValue");
    assert_eq!(id["value"]["typeName"]["value"], "string");
    assert!(id["value"].get("isOptional").is_none());
}

// =============================================================================
// Unions
// =============================================================================

#[test]
fn test_discriminated_union() {
    let output = parse_fixture(include_str!("fixtures/discriminated_union.json"));
    assert!(output.violations.is_empty(), "{:?}", output.violations);

    let pet = output.service.find_union("Pet").unwrap();
    assert_eq!(pet.kind, UnionKind::Discriminated);
    assert_eq!(pet.discriminator.as_ref().unwrap().value, "kind");
    let members: Vec<&str> = pet.members.iter().filter_map(|m| m.complex_name()).collect();
    assert_eq!(members, vec!["Cat", "Dog"]);

    let description = pet.description.as_ref().unwrap();
    assert_eq!(description.len(), 2);
    assert_eq!(description[1].value, "Discriminated on kind.");

    let cat = output.service.find_type("Cat").unwrap();
    match &cat.property("kind").unwrap().value {
        MemberValue::Primitive(p) => assert!(p.constant.is_some()),
        other => panic!("Expected primitive, got {:?}", other),
    }

    assert_referential_closure(&output.service);
}

#[test]
fn test_discriminated_union_drops_primitive_member() {
    let output = parse_fixture(include_str!("fixtures/discriminated_union_primitive.json"));

    assert_eq!(codes(&output), vec![ViolationCode::MisconfiguredDiscriminator]);
    assert_eq!(output.violations[0].severity, Severity::Error);

    let pet = output.service.find_union("Pet").unwrap();
    assert_eq!(pet.members.len(), 1);
    assert_eq!(pet.members[0].complex_name(), Some("Cat"));
}

#[test]
fn test_discriminator_mapping_is_ignored() {
    let output = parse_fixture(include_str!("fixtures/discriminator_mapping.json"));

    assert_eq!(codes(&output), vec![ViolationCode::UnsupportedFeature]);
    assert_eq!(output.violations[0].severity, Severity::Info);

    let pet = output.service.find_union("Pet").unwrap();
    assert_eq!(pet.kind, UnionKind::Discriminated);
    let members: Vec<&str> = pet.members.iter().filter_map(|m| m.complex_name()).collect();
    assert_eq!(members, vec!["Cat", "Dog"]);

    assert_referential_closure(&output.service);
}

#[test]
fn test_complex_and_simple_unions() {
    let output = parse_fixture(include_str!("fixtures/union_kinds.json"));
    let service = &output.service;
    assert!(output.violations.is_empty(), "{:?}", output.violations);

    let shape = service.find_union("Shapes_shape").unwrap();
    assert_eq!(shape.kind, UnionKind::Complex);
    assert!(shape.discriminator.is_none());
    let members: Vec<&str> = shape.members.iter().filter_map(|m| m.complex_name()).collect();
    assert_eq!(members, vec!["Circle", "Square"]);

    let nothing = service.find_union("Shapes_nothing").unwrap();
    assert_eq!(nothing.kind, UnionKind::Simple);
    assert!(nothing.members.is_empty());

    let root = service.find_type("Shapes").unwrap();
    assert_eq!(root.property("shape").unwrap().value.complex_name(), Some("Shapes_shape"));
    assert_eq!(root.property("nothing").unwrap().value.complex_name(), Some("Shapes_nothing"));

    assert_referential_closure(service);
}

// =============================================================================
// References
// =============================================================================

#[test]
fn test_unresolved_reference() {
    let output = parse_fixture(include_str!("fixtures/unresolved_ref.json"));

    assert_eq!(codes(&output), vec![ViolationCode::UnresolvedReference]);
    assert_eq!(output.violations[0].severity, Severity::Error);
    assert_eq!(output.violations[0].source_path, "schema.json");

    let order = output.service.find_type("Order").unwrap();
    assert!(order.property("customer").unwrap().value.is_untyped());
    match &order.property("total").unwrap().value {
        MemberValue::Primitive(p) => assert_eq!(p.type_name.value, Primitive::Double),
        other => panic!("Expected double, got {:?}", other),
    }
}

#[test]
fn test_recursive_references_terminate() {
    let output = parse_fixture(include_str!("fixtures/recursive.json"));

    let tree = output.service.find_type("TreeNode").unwrap();
    let children = tree.property("children").unwrap();
    assert_eq!(children.value.complex_name(), Some("TreeNode"));
    assert!(children.value.is_array());
    assert_eq!(tree.property("parent").unwrap().value.complex_name(), Some("TreeNode"));

    assert!(!output.violations.is_empty());
    assert!(output
        .violations
        .iter()
        .all(|v| v.code == ViolationCode::CircularReference));
    assert_eq!(output.service.types.len(), 1);
}

// =============================================================================
// Composition
// =============================================================================

#[test]
fn test_composition_keywords() {
    let output = parse_fixture(include_str!("fixtures/composition.json"));
    let service = &output.service;

    let names: Vec<&str> = service.types.iter().map(|t| t.name.value.as_str()).collect();
    assert_eq!(names, vec!["Base", "Catalog_item", "Catalog"]);

    // allOf: later members replace earlier properties in place
    let item = service.find_type("Catalog_item").unwrap();
    let props: Vec<&str> = item.properties.iter().map(|p| p.name.value.as_str()).collect();
    assert_eq!(props, vec!["id", "createdAt", "price"]);
    match &item.properties[0].value {
        MemberValue::Primitive(p) => assert_eq!(p.type_name.value, Primitive::Long),
        other => panic!("Expected long, got {:?}", other),
    }
    assert!(matches!(
        item.property("price").unwrap().value.rules(),
        [ValidationRule::NumberGt { .. }]
    ));
    assert_eq!(item.rules.len(), 2);

    let status = service.find_enum("Catalog_status").unwrap();
    assert_eq!(status.members.len(), 2);

    let scalar = service.find_union("Catalog_scalar").unwrap();
    assert_eq!(scalar.kind, UnionKind::Primitive);
    assert!(service.find_union("Catalog_mixed").is_none());

    let catalog = service.find_type("Catalog").unwrap();
    match &catalog.property("level").unwrap().value {
        MemberValue::Primitive(p) => assert_eq!(p.type_name.value, Primitive::Integer),
        other => panic!("Expected integer fallback, got {:?}", other),
    }
    assert!(catalog.property("either").unwrap().value.is_untyped());
    assert!(catalog.property("nullable").unwrap().value.is_untyped());
    assert!(catalog.property("mixed").unwrap().value.is_untyped());

    let errors = output.violations.iter().filter(|v| v.severity == Severity::Error).count();
    let infos = output.violations.iter().filter(|v| v.severity == Severity::Info).count();
    assert_eq!(errors, 1);
    assert_eq!(infos, 4);

    assert_referential_closure(service);
    assert_unique_names(service);
}

// =============================================================================
// Tuple Items
// =============================================================================

#[test]
fn test_tuple_items_abort_by_default() {
    match parse(include_str!("fixtures/tuple_items.json"), "schema.json") {
        Err(ParseError::UnsupportedTupleItems { pointer }) => {
            assert_eq!(pointer, "#/properties/point")
        }
        other => panic!("Expected UnsupportedTupleItems, got {:?}", other),
    }
}

#[test]
fn test_tuple_items_untyped_policy() {
    let options = ParserOptions {
        tuple_items: TupleItemsPolicy::Untyped,
        ..ParserOptions::default()
    };
    let output =
        parse_with_options(include_str!("fixtures/tuple_items.json"), "schema.json", &options).unwrap();

    assert_eq!(codes(&output), vec![ViolationCode::UnsupportedFeature]);
    let root = output.service.find_type("Root").unwrap();
    let point = root.property("point").unwrap();
    assert!(point.value.is_untyped());
    assert!(point.value.is_array());
}

#[test]
fn test_syntax_error() {
    match parse("{\"type\": }", "broken.json") {
        Err(ParseError::Syntax { line, .. }) => assert_eq!(line, 1),
        other => panic!("Expected Syntax error, got {:?}", other),
    }
}

#[test]
fn test_repeated_parses_are_independent() {
    let source = include_str!("fixtures/composition.json");
    let first = parse_fixture(source);
    let second = parse_fixture(source);
    assert_eq!(first, second);
}
