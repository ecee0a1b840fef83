/*============================================================
  PkgSpec Project: pkgspec
  Module: pkgspec_core::main
  ------------------------------------------------------------
  Purpose:
    Entry point for PkgSpec. Runs a PKGBUILD in a clean shell,
    extracts the metadata it defines, translates dependency
    names, and writes `<stem>.json` and `<stem>.spec`.

  Security / Safety Notes:
    Executes the descriptor as shell code with the operator's
    privileges. Only convert PKGBUILDs you would build.

  Dependencies:
    clap for CLI parsing, tokio for the child process,
    chrono for log file stamps.

  Operational Scope:
    Invoked once per package by the packaging pipeline.

  Revision History:
    2025-02-11 RKM  Authored conversion runtime.
    2025-03-02 RKM  Added --dry-run and --shell.
  ------------------------------------------------------------
  Principles Observed:
    - Result-first error handling with deterministic exits
    - Structured logging for every pipeline stage
    - Configurable execution via CLI and config file
============================================================*/

mod config;
mod dump;
mod error;
mod logger;
mod mapping;
mod metadata;
mod output;
mod shell;
mod spec_writer;
mod value;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::{ArgAction, Parser};

use config::PkgspecConfig;
use dump::{diff_environments, parse_dump};
use error::{PkgspecError, Result};
use logger::{LogLevel, Logger};
use mapping::NameMapping;
use metadata::{EnrichOptions, PackageMetadata};
use output::{render_json, write_outputs, OutputPaths};
use shell::extract_environment;
use spec_writer::render_spec;

/// Command-line arguments for PkgSpec.
#[derive(Debug, Parser)]
#[command(
    name = "pkgspec",
    version,
    about = "Convert an Arch Linux PKGBUILD into an RPM spec file"
)]
struct Cli {
    /// Path to the PKGBUILD to convert.
    #[arg(value_name = "PKGBUILD")]
    pkgbuild: PathBuf,
    /// Output path stem; `.json` and `.spec` are appended.
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,
    /// Override the name mapping table.
    #[arg(long, value_name = "PATH")]
    mapping: Option<PathBuf>,
    /// Override configuration file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Explicit log file path.
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
    /// Interpreter used to evaluate the PKGBUILD.
    #[arg(long, value_name = "PROGRAM")]
    shell: Option<String>,
    /// Print the spec to stdout instead of writing files.
    #[arg(long, action = ArgAction::SetTrue)]
    dry_run: bool,
    /// Enable verbose logging to stderr.
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[PkgSpec] {}", err);
            err.exit_code()
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = PkgspecConfig::load_from_optional_path(cli.config.as_deref())?;

    let log_path = cli.log.clone().or_else(|| {
        let stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S");
        config
            .log_dir
            .as_ref()
            .map(|dir| dir.join(format!("convert_{stamp}.log")))
    });
    let logger = Logger::new(log_path, cli.verbose)?;
    logger.info(
        "INIT",
        format!("Converting {}", cli.pkgbuild.display()),
    );

    match convert(&cli, &config, &logger).await {
        Ok(()) => {
            logger.info("COMPLETE", "Conversion finished.");
            logger.finalize()?;
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("[PkgSpec] {}", err);
            logger.record(LogLevel::Error, "FATAL", err.to_string());
            logger.finalize()?;
            Ok(err.exit_code())
        }
    }
}

async fn convert(cli: &Cli, config: &PkgspecConfig, logger: &Logger) -> Result<()> {
    let descriptor = read_descriptor(&cli.pkgbuild)?;
    let shell = cli.shell.as_deref().unwrap_or(&config.shell);

    let snapshots = extract_environment(&descriptor, shell).await?;
    logger.debug(
        "EXTRACT",
        format!(
            "{shell} dumps: before={}B after={}B",
            snapshots.before.len(),
            snapshots.after.len()
        ),
    );

    let before = parse_dump(&snapshots.before)?;
    let after = parse_dump(&snapshots.after)?;
    let defined = diff_environments(&before, after);
    logger.debug(
        "DIFF",
        format!(
            "descriptor defined {} variables and {} functions",
            defined.variables.len(),
            defined.functions.len()
        ),
    );

    let mut metadata = PackageMetadata::from_environment(&defined, logger);

    let mapping_path = cli.mapping.as_deref().unwrap_or(&config.mapping);
    let mapping = NameMapping::load(mapping_path)?;
    if mapping.is_empty() {
        logger.warn(
            "MAPPING",
            format!("{} has no entries; names pass through", mapping_path.display()),
        );
    }
    logger.info(
        "MAPPING",
        format!(
            "Loaded {} name mappings from {}",
            mapping.len(),
            mapping_path.display()
        ),
    );
    metadata.enrich(
        &mapping,
        EnrichOptions {
            obsoletes_from_replaces: config.translate.obsoletes_from_replaces,
        },
    );

    let json = render_json(&metadata)?;
    let spec = render_spec(&metadata);

    if cli.dry_run {
        print!("{spec}");
        return Ok(());
    }

    let paths = OutputPaths::from_stem(&cli.output);
    write_outputs(&paths, &json, &spec)?;
    logger.info(
        "OUTPUT",
        format!(
            "Wrote {} and {}",
            paths.json.display(),
            paths.spec.display()
        ),
    );
    Ok(())
}

fn read_descriptor(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|err| {
        PkgspecError::Filesystem(format!("Failed to read PKGBUILD {}: {err}", path.display()))
    })
}
