//! Configuration management for jsonschema-ir
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (jsonschema-ir.toml)
//! - Environment variables (JSONSCHEMA_IR__*)
//!
//! ## Example config file (jsonschema-ir.toml):
//! ```toml
//! [parser]
//! root_type_name = "Document"
//! tuple_items = "untyped"
//!
//! [output]
//! format = "compact"
//! include_violations = true
//!
//! [logging]
//! filter = "jsonschema_ir=debug"
//! ```

use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IrConfig {
    #[serde(default)]
    pub parser: ParserOptions,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Options that change the produced IR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserOptions {
    /// Name of the document root when it has no `title`
    #[serde(default = "default_root_type_name")]
    pub root_type_name: String,

    /// What to do with positional `items: [...]`
    #[serde(default)]
    pub tuple_items: TupleItemsPolicy,
}

/// Handling of tuple-style `items`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TupleItemsPolicy {
    /// Fail the whole parse
    #[default]
    Abort,
    /// Produce an untyped array and an info violation
    Untyped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Emit violations next to the service in `parse` output
    #[serde(default = "default_true")]
    pub include_violations: bool,
}

/// Output format for JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Compact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_root_type_name() -> String {
    "Root".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_filter() -> String {
    "jsonschema_ir=info".to_string()
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            root_type_name: default_root_type_name(),
            tuple_items: TupleItemsPolicy::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            include_violations: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl IrConfig {
    /// Load configuration, layering an explicit file over the default locations
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_locations = [
            "jsonschema-ir.toml",
            ".jsonschema-ir.toml",
            "config/jsonschema-ir.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(dirs) = directories::ProjectDirs::from("dev", "jsonschema-ir", "jsonschema-ir") {
            let xdg_config = dirs.config_dir().join("jsonschema-ir.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("JSONSCHEMA_IR")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseError;

    #[test]
    fn test_default_config() {
        let config = IrConfig::default();
        assert_eq!(config.parser.root_type_name, "Root");
        assert_eq!(config.parser.tuple_items, TupleItemsPolicy::Abort);
        assert_eq!(config.output.format, OutputFormat::Pretty);
        assert!(config.output.include_violations);
    }

    #[test]
    fn test_serialize_config() {
        let toml_str = IrConfig::default().to_toml().unwrap();
        assert!(toml_str.contains("[parser]"));
        assert!(toml_str.contains("[output]"));
        assert!(toml_str.contains("tuple_items = \"abort\""));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[parser]\nroot_type_name = \"Document\"\ntuple_items = \"untyped\"\n\n[output]\nformat = \"compact\"\n",
        )
        .unwrap();

        let config = IrConfig::load_from(Some(&path)).unwrap();
        assert_eq!(config.parser.root_type_name, "Document");
        assert_eq!(config.parser.tuple_items, TupleItemsPolicy::Untyped);
        assert_eq!(config.output.format, OutputFormat::Compact);
        assert!(config.output.include_violations);
    }

    #[test]
    fn test_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");

        let mut config = IrConfig::default();
        config.logging.filter = "jsonschema_ir=trace".to_string();
        config.save(&path).unwrap();

        let loaded = IrConfig::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.logging.filter, "jsonschema_ir=trace");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        match IrConfig::load_from(Some(&path)) {
            Err(ParseError::Config(_)) => {}
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_save_into_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("saved.toml");

        match IrConfig::default().save(&path) {
            Err(ParseError::Io(_)) => {}
            other => panic!("Expected Io error, got {:?}", other),
        }
    }
}
