pub mod commands;
pub mod ingest;

use std::path::PathBuf;
use std::process::ExitCode;

use affinity_core::config::{AppConfig, ConfigOverrides, LoadOptions, LoggingConfig};
use affinity_core::report::DEFAULT_TOP_ITEMS;
use clap::{Parser, Subcommand};
use tracing::Level;

use commands::mine::OutputFormat;
use commands::{CommandResult, InputArgs, TuningArgs};

#[derive(Debug, Parser)]
#[command(
    name = "affinity",
    about = "Association rule mining and item recommendations",
    long_about = "Mine frequent itemsets from purchase baskets, derive association rules, and rank follow-up items.",
    after_help = "Examples:\n  affinity mine --input orders.csv --min-support 0.01\n  affinity recommend --input services.csv --format services --item 9_4 --count 3\n  affinity config"
)]
pub struct Cli {
    #[arg(
        long = "config",
        global = true,
        help = "Configuration file (defaults to affinity.toml or config/affinity.toml)"
    )]
    config_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Mine frequent itemsets and print the association rule table")]
    Mine {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        tuning: TuningArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json, help = "Rule table encoding")]
        output: OutputFormat,
    },
    #[command(about = "Rank the consequents of rules whose antecedent contains an item")]
    Recommend {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        tuning: TuningArgs,
        #[arg(long, help = "Item to recommend for")]
        item: String,
        #[arg(long, help = "Number of recommendations to return")]
        count: Option<usize>,
    },
    #[command(about = "Describe the dataset and the mining run")]
    Summary {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        tuning: TuningArgs,
        #[arg(long, default_value_t = DEFAULT_TOP_ITEMS, help = "Most frequent items to list")]
        top: usize,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let result = execute(cli);

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Run a parsed command line and collect its output.
pub fn execute(cli: Cli) -> CommandResult {
    let config_path = cli.config_file;

    match cli.command {
        Command::Mine { input, tuning, output } => {
            with_config("mine", config_path, tuning.overrides(), |config| {
                commands::mine::run(config, &input, output)
            })
        }
        Command::Recommend { input, tuning, item, count } => {
            let overrides = ConfigOverrides { recommendation_count: count, ..tuning.overrides() };
            with_config("recommend", config_path, overrides, |config| {
                commands::recommend::run(config, &input, &item)
            })
        }
        Command::Summary { input, tuning, top } => {
            with_config("summary", config_path, tuning.overrides(), |config| {
                commands::summary::run(config, &input, top)
            })
        }
        Command::Config => commands::config::run(config_path.as_deref()),
    }
}

fn with_config(
    command: &str,
    config_path: Option<PathBuf>,
    overrides: ConfigOverrides,
    run: impl FnOnce(&AppConfig) -> CommandResult,
) -> CommandResult {
    let require_file = config_path.is_some();
    let options = LoadOptions { config_path, require_file, overrides };

    match AppConfig::load(options) {
        Ok(config) => {
            init_logging(&config.logging);
            run(&config)
        }
        Err(error) => CommandResult::failure(command, "config_validation", error.to_string(), 2),
    }
}

/// Logs go to stderr so stdout carries only the command payload.
fn init_logging(logging: &LoggingConfig) {
    use affinity_core::config::LogFormat::*;

    let log_level = logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    // a subscriber may already be installed when commands run in-process
    let _ = match logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
}
