//! Command-line interface definitions.
//!
//! Defines the CLI structure for the faultline control plane using `clap`.
//! The CLI applies database migrations, normalizes manifests offline and
//! inspects configuration.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Chaos experiment control plane CLI
#[derive(Parser, Debug)]
#[command(name = "faultline")]
#[command(version)]
pub struct Cli {
    /// Color output mode [auto, always, never]
    #[arg(
        long,
        global = true,
        default_value = "auto",
        hide_possible_values = true
    )]
    pub color: ColorChoice,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase output verbosity
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Color output mode for terminal rendering.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum ColorChoice {
    /// Detect automatically
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Top-level subcommands for the faultline CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or upgrade the experiment database
    Migrate(ConfigPathArg),

    /// Normalize a manifest file without touching the database
    Normalize(NormalizeArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Subcommands for `faultline config`.
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Display the effective configuration with defaults applied.
    Show(ConfigPathArg),
    /// Validate a configuration file for correctness.
    Validate(ConfigPathArg),
}

/// Shared `--config` argument.
#[derive(clap::Args, Debug)]
pub struct ConfigPathArg {
    /// Path to the configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}

/// Arguments for `faultline normalize`.
#[derive(clap::Args, Debug)]
pub struct NormalizeArgs {
    /// Manifest file (JSON).
    pub manifest: PathBuf,

    /// Experiment name the manifest's metadata.name must match.
    /// Defaults to the manifest's own name.
    #[arg(long)]
    pub name: Option<String>,

    /// Experiment ID to stamp. A fresh one is generated when omitted.
    #[arg(long)]
    pub experiment_id: Option<String>,

    /// Target infra ID.
    #[arg(long, default_value = "local")]
    pub infra: String,

    /// Owning project ID.
    #[arg(long, default_value = "default")]
    pub project: String,

    /// Revision ID to stamp.
    #[arg(long, default_value = "1")]
    pub revision: String,

    /// Caller weight override as `fault=weight`; repeatable.
    #[arg(long = "weight", value_parser = parse_weight)]
    pub weights: Vec<(String, i32)>,
}

fn parse_weight(raw: &str) -> Result<(String, i32), String> {
    let (fault, weight) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected fault=weight, got '{raw}'"))?;
    let weight = weight
        .trim()
        .parse()
        .map_err(|e| format!("invalid weight for '{fault}': {e}"))?;
    Ok((fault.trim().to_string(), weight))
}
