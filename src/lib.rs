//! JSON Schema to IR
//!
//! Converts a single JSON Schema document into a language-agnostic
//! intermediate representation of Types, Enums, Unions, Properties and
//! ValidationRules for code generators.
//!
//! ## Pipeline
//!
//! ```text
//! source text
//!   └─ json::parse_document      span-tracking JSON tree
//!        └─ graph::TypeGraphBuilder
//!             ├─ pointer         $ref resolution, name inference, required
//!             └─ rules           per-keyword validation rules
//!                  └─ ParseOutput { service, violations }
//! ```
//!
//! Problems in the schema are reported as [`Violation`]s next to a
//! best-effort IR. Only malformed JSON and tuple-style `items` (unless
//! configured otherwise) fail the parse.
//!
//! ```no_run
//! let output = jsonschema_ir::parse(r#"{"title": "Pet", "type": "object"}"#, "pet.json")?;
//! assert_eq!(output.service.types[0].name.value, "Pet");
//! # Ok::<(), jsonschema_ir::ParseError>(())
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod ir;
pub mod json;
pub mod pointer;
pub mod rules;
pub mod schema;

pub use config::{IrConfig, OutputFormat, ParserOptions, TupleItemsPolicy};
pub use error::{ParseError, Result};
pub use graph::{BuildContext, Severity, TypeGraphBuilder, Violation, ViolationCode};
pub use ir::Service;

use serde::{Deserialize, Serialize};

use crate::ir::{loc, Literal};
use crate::json::Node;
use crate::pointer::PointerResolver;

/// IR plus the violations found while building it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseOutput {
    pub service: Service,
    pub violations: Vec<Violation>,
}

/// A parsed document ready to be transformed
#[derive(Debug)]
pub struct JsonSchemaParser {
    document: Node,
    source_path: String,
    options: ParserOptions,
}

impl JsonSchemaParser {
    pub fn new(source: &str, source_path: impl Into<String>, options: ParserOptions) -> Result<Self> {
        Ok(Self {
            document: json::parse_document(source)?,
            source_path: source_path.into(),
            options,
        })
    }

    /// Build the IR. Each call starts from empty registries.
    #[tracing::instrument(skip(self), fields(source_path = %self.source_path))]
    pub fn parse(&self) -> Result<ParseOutput> {
        let resolver = PointerResolver::new(&self.document, self.options.root_type_name.clone());
        let builder = TypeGraphBuilder::new(resolver, &self.options);
        let mut ctx = BuildContext::new(self.source_path.clone());

        builder.build(&mut ctx)?;

        let title = builder.resolver().infer_type_name(&builder.resolver().root());

        tracing::debug!(
            types = ctx.types.len(),
            enums = ctx.enums.len(),
            unions = ctx.unions.len(),
            violations = ctx.violations.len(),
            "parsed schema"
        );

        Ok(ParseOutput {
            service: Service {
                title: Literal::new(title.value, title.range),
                major_version: Literal::unlocated(0),
                source_paths: vec![self.source_path.clone()],
                loc: Some(loc(self.document.range)),
                interfaces: Vec::new(),
                types: ctx.types.into_values().collect(),
                enums: ctx.enums.into_values().collect(),
                unions: ctx.unions.into_values().collect(),
            },
            violations: ctx.violations.into_vec(),
        })
    }
}

/// Parse with default options
pub fn parse(source: &str, source_path: &str) -> Result<ParseOutput> {
    parse_with_options(source, source_path, &ParserOptions::default())
}

pub fn parse_with_options(
    source: &str,
    source_path: &str,
    options: &ParserOptions,
) -> Result<ParseOutput> {
    JsonSchemaParser::new(source, source_path, options.clone())?.parse()
}
