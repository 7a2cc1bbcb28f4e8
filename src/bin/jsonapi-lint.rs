//! JSON:API lint CLI
//!
//! Command-line interface for dereferencing OpenAPI documents, checking
//! their references, and inspecting the JSON:API ruleset.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jsonapi_lint::{
    dereference, jsonapi_ruleset, lint, load_document_auto, load_ruleset, CyclePolicy,
    FileStatus, RefOptions, Ruleset, RulesetError, Severity,
};

#[derive(Parser)]
#[command(name = "jsonapi-lint")]
#[command(about = "Dereference OpenAPI documents and inspect JSON:API lint rules")]
#[command(version)]
struct Cli {
    /// Log resolution details to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inline every $ref pointer in a document
    Resolve {
        /// Document source: file path or URL (http:// or https://)
        document: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Emit YAML instead of JSON
        #[arg(long, conflicts_with = "pretty")]
        yaml: bool,

        /// Keep shared definitions that were inlined
        #[arg(long)]
        keep_definitions: bool,

        /// Leave circular references as $ref nodes instead of failing
        #[arg(long)]
        preserve_cycles: bool,

        /// Pointer prefix of the shared-definitions subtree
        #[arg(long, default_value = "#/components/")]
        definitions_prefix: String,
    },

    /// Check documents for broken, circular and external references
    Check {
        /// File or directory to check
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },

    /// Validate and list a ruleset (the bundled JSON:API rules by default)
    Rules {
        /// Ruleset file (JSON or YAML)
        #[arg(long)]
        ruleset: Option<PathBuf>,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Enable a rule that is off by default
        #[arg(long)]
        enable: Vec<String>,

        /// Disable a rule
        #[arg(long)]
        disable: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Resolve {
            document,
            output,
            pretty,
            yaml,
            keep_definitions,
            preserve_cycles,
            definitions_prefix,
        } => {
            let options = RefOptions::new()
                .definitions_prefix(definitions_prefix)
                .prune(!keep_definitions)
                .on_cycle(if preserve_cycles {
                    CyclePolicy::Preserve
                } else {
                    CyclePolicy::Error
                });
            run_resolve(&document, &options, output, pretty, yaml)
        }

        Commands::Check {
            path,
            format,
            strict,
            quiet,
        } => run_check(&path, &format, strict, quiet),

        Commands::Rules {
            ruleset,
            format,
            enable,
            disable,
        } => run_rules(ruleset.as_deref(), &format, &enable, &disable),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

/// Send logs to stderr; RUST_LOG wins over the verbosity flag.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_resolve(
    source: &str,
    options: &RefOptions,
    output: Option<PathBuf>,
    pretty: bool,
    yaml: bool,
) -> Result<(), u8> {
    let mut document = load_document_auto(source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    dereference(&mut document, options).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    info!(source, "dereferenced document");

    let rendered = if yaml {
        serde_yaml::to_string(&document).map_err(|e| e.to_string())
    } else if pretty {
        serde_json::to_string_pretty(&document).map_err(|e| e.to_string())
    } else {
        serde_json::to_string(&document).map_err(|e| e.to_string())
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
            debug!(path = %path.display(), "wrote output");
        }
        None => {
            println!("{}", rendered.trim_end());
        }
    }

    Ok(())
}

fn run_check(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);

    if format == "json" {
        let rendered = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", rendered);
    } else {
        if !quiet {
            println!("Checking {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let color = match diag.severity {
                    Severity::Error => "\x1b[31m",
                    _ => "\x1b[33m",
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color,
                        diag.severity.as_str(),
                        diag.code,
                        diag.path,
                        diag.message
                    );
                }
            }
        }

        println!();
        if passed(&result, strict) {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if passed(&result, strict) {
        Ok(())
    } else {
        Err(1)
    }
}

fn passed(result: &jsonapi_lint::LintResult, strict: bool) -> bool {
    result.is_ok() && (!strict || result.warnings == 0)
}

fn run_rules(
    source: Option<&Path>,
    format: &str,
    enable: &[String],
    disable: &[String],
) -> Result<(), u8> {
    let ruleset = select_rules(source, enable, disable).map_err(|e| {
        eprintln!("Error: {}", e);
        if let RulesetError::Invalid { errors } = &e {
            for error in errors {
                eprintln!("  {}", error);
            }
        }
        e.exit_code() as u8
    })?;

    if format == "json" {
        let enabled = ruleset
            .enabled_rules()
            .map(|(name, rule)| serde_json::to_value(rule).map(|value| (name.to_string(), value)))
            .collect::<Result<serde_json::Map<String, serde_json::Value>, _>>()
            .map_err(|e| {
                eprintln!("Error serializing output: {}", e);
                2u8
            })?;
        println!("{}", serde_json::json!({ "rules": enabled }));
    } else {
        for (name, rule) in ruleset.enabled_rules() {
            println!("{:<5}  {}  {}", rule.severity.as_str(), name, rule.description);
        }
    }

    Ok(())
}

fn select_rules(
    source: Option<&Path>,
    enable: &[String],
    disable: &[String],
) -> Result<Ruleset, RulesetError> {
    let mut ruleset = match source {
        Some(path) => load_ruleset(path)?,
        None => jsonapi_ruleset()?,
    };
    for name in enable {
        ruleset.enable(name)?;
    }
    for name in disable {
        ruleset.disable(name)?;
    }
    Ok(ruleset)
}
