//! Foundry CLI: command-line driver for the Agent Foundry risk engine.
//!
//! Reads JSON from files (or stdin with `-`), runs the scoring, analysis,
//! taxonomy, drift, prediction, or forecast pipelines, and prints JSON or
//! Markdown.

mod commands;

use clap::Parser;
use foundry_risk::{SortDirection, SortField};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Foundry: compliance risk scoring and analysis
#[derive(Parser, Debug)]
#[command(name = "foundry", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (for .foundry/config.toml)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

/// Output rendering.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Json,
    Markdown,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Score compliance gaps and print ranked risk items
    Score {
        /// JSON file of gaps (array, {"gaps": [...]}, or {"recommendations": [...]}); `-` for stdin
        input: PathBuf,
        /// Sort key: riskScore, severity, title
        #[arg(short, long)]
        sort: Option<SortField>,
        /// Sort direction: asc, desc
        #[arg(short, long)]
        direction: Option<SortDirection>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Bucket scored gaps into the 4x4 risk matrix
    Matrix {
        /// JSON file of gaps; `-` for stdin
        input: PathBuf,
    },
    /// Run rule-based gap analysis over compliance records, then score the gaps
    Analyze {
        /// JSON file of records (array or {"compliance_data": [...]}); `-` for stdin
        input: PathBuf,
        /// Evaluate staleness as of this RFC 3339 timestamp instead of now
        #[arg(long)]
        as_of: Option<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Classify regulations into taxonomy clusters
    Classify {
        /// JSON file of regulations (array or {"regulations": [...]}); `-` for stdin
        input: PathBuf,
    },
    /// Check metric samples for drift
    Drift {
        /// JSON file with one metric sample or an array of samples; `-` for stdin
        input: PathBuf,
        /// JSON array of normal-behavior samples to fit the baseline from
        #[arg(short, long)]
        baseline: Option<PathBuf>,
        /// Z-score threshold (overrides config)
        #[arg(short, long)]
        threshold: Option<f64>,
    },
    /// Predict regulatory changes from historical change signals
    Predict {
        /// JSON array of signals, {"regulations": [...]}, or {"regulation_ids": [...]}; `-` for stdin
        input: PathBuf,
    },
    /// Forecast regulatory activity from a market signal history
    Forecast {
        /// JSON history array or {"industry", "history", "forecast_periods"}; `-` for stdin
        input: PathBuf,
        /// Industry label (overrides the input)
        #[arg(short, long)]
        industry: Option<String>,
        /// Number of future periods (overrides input and config)
        #[arg(short, long)]
        periods: Option<usize>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Create default configuration file
    Init,
    /// Show current configuration
    Show,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "agentfoundry", "foundry")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "foundry.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    commands::handle_command(cli.command, &workspace, cli.config.as_deref())
}
