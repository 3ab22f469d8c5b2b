//! jsonschema-ir CLI
//!
//! Transforms JSON Schema documents into IR and reports violations.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use jsonschema_ir::{IrConfig, OutputFormat, ParseOutput, Severity};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "jsonschema-ir")]
#[command(about = "Transform JSON Schema documents into a language-agnostic IR")]
struct Cli {
    /// Config file layered over the default locations
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse one schema and print its IR
    Parse {
        /// Schema file
        file: PathBuf,
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override the configured output format
        #[arg(long)]
        format: Option<Format>,
        /// Exit with status 1 if any error violation is reported
        #[arg(long)]
        strict: bool,
    },

    /// Report violations for a schema file or every *.json under a directory
    Check {
        path: PathBuf,
    },

    /// Print or save the effective configuration
    Config {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Pretty,
    Compact,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Pretty => OutputFormat::Pretty,
            Format::Compact => OutputFormat::Compact,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match IrConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: failed to load configuration: {}", e);
            std::process::exit(2);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli.command, &config) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

/// `Ok(false)` when the command completed but found errors
fn run(command: Commands, config: &IrConfig) -> Result<bool> {
    match command {
        Commands::Parse {
            file,
            output,
            format,
            strict,
        } => {
            let result = parse_file(&file, config)?;
            let format = format.map(OutputFormat::from).unwrap_or(config.output.format);

            let value = if config.output.include_violations {
                serde_json::to_value(&result)?
            } else {
                serde_json::to_value(&result.service)?
            };
            let rendered = match format {
                OutputFormat::Pretty => serde_json::to_string_pretty(&value)?,
                OutputFormat::Compact => serde_json::to_string(&value)?,
            };

            match output {
                Some(path) => {
                    fs::write(&path, rendered)
                        .with_context(|| format!("writing {}", path.display()))?;
                    eprintln!("✅ Wrote IR to {}", path.display());
                }
                None => println!("{}", rendered),
            }

            let has_errors = result.violations.iter().any(|v| v.severity == Severity::Error);
            Ok(!(strict && has_errors))
        }

        Commands::Check { path } => {
            let files = collect_schemas(&path);
            if files.is_empty() {
                println!("No *.json files found under {}", path.display());
                return Ok(true);
            }

            let mut failed = 0usize;
            let mut total_violations = 0usize;

            for file in &files {
                match parse_file(file, config) {
                    Ok(result) => {
                        let errors = result
                            .violations
                            .iter()
                            .filter(|v| v.severity == Severity::Error)
                            .count();
                        if errors > 0 {
                            failed += 1;
                            println!("❌ {}", file.display());
                        } else {
                            println!("✅ {}", file.display());
                        }
                        for violation in &result.violations {
                            println!("   {}", violation);
                        }
                        total_violations += result.violations.len();
                    }
                    Err(e) => {
                        failed += 1;
                        println!("❌ {}: {:#}", file.display(), e);
                    }
                }
            }

            println!();
            println!(
                "📊 {} file(s), {} violation(s), {} failed",
                files.len(),
                total_violations,
                failed
            );
            Ok(failed == 0)
        }

        Commands::Config { output } => {
            match output {
                Some(path) => {
                    config
                        .save(&path)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("✅ Saved configuration to {}", path.display());
                }
                None => print!("{}", config.to_toml()?),
            }
            Ok(true)
        }
    }
}

fn parse_file(path: &Path, config: &IrConfig) -> Result<ParseOutput> {
    let source =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let result = jsonschema_ir::parse_with_options(&source, &path.display().to_string(), &config.parser)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(result)
}

/// A single file, or every `*.json` below a directory in sorted order
fn collect_schemas(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map(|ext| ext == "json").unwrap_or(false))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}
