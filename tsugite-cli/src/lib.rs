//! Command-line front end for the tsugite generator.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use tsugite_core::GeneratorConfig;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("no input files; run `tsugite generate <FILE|DIR>…`")]
    NoInputs,

    #[error(transparent)]
    Core(#[from] tsugite_core::Error),
}

#[derive(Parser)]
#[command(
    name = "tsugite",
    author,
    version,
    about = "Compile-time dependency injection code generator",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Diagnostics verbosity
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Path to a JSON generator config
    #[arg(long, short = 'c', global = true, env = "TSUGITE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate wiring code for the given files or directories
    Generate(GenerateArgs),

    /// Bare paths are shorthand for `generate`
    #[command(external_subcommand)]
    Paths(Vec<String>),
}

#[derive(Parser)]
pub struct GenerateArgs {
    /// Source files or package directories
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

pub fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_env("TSUGITE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

pub fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    let config = match &cli.config {
        Some(path) => GeneratorConfig::from_file(path).map_err(CliError::Core)?,
        None => GeneratorConfig::default(),
    };

    let paths = match cli.command {
        Some(Commands::Generate(args)) => args.paths,
        Some(Commands::Paths(raw)) => raw.iter().map(PathBuf::from).collect(),
        None => return Err(CliError::NoInputs),
    };

    let summary = tsugite_core::generate(&paths, &config)?;
    info!(
        files = summary.written.len(),
        injectors = summary.injectors,
        "generation complete"
    );
    Ok(())
}
