use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use sieve_cli::{list_rules, run_check, CheckOptions, OutputFormat};

#[derive(Parser)]
#[command(name = "sieve")]
#[command(about = "Check argument values against the constraints declared in a schema", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the argument values of one field
    Check {
        /// Schema file (JSON or YAML)
        #[arg(short, long)]
        schema: PathBuf,

        /// Field to validate, as `Type.field`
        #[arg(short, long)]
        field: String,

        /// Argument values (JSON or YAML object)
        #[arg(long)]
        values: PathBuf,

        /// Locale for error messages
        #[arg(short, long, env = "SIEVE_LOCALE")]
        locale: Option<String>,

        /// Validator config (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// List every constrained site in a schema
    Rules {
        /// Schema file (JSON or YAML)
        #[arg(short, long)]
        schema: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::TRACE
    } else if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::from_level(level).into())
                .from_env_lossy(),
        )
        .with_target(cli.debug) // Show target module in debug mode
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            schema,
            field,
            values,
            locale,
            config,
            format,
        } => {
            let report = run_check(&CheckOptions {
                schema,
                field,
                values,
                locale,
                config,
                format,
            })?;
            println!("{}", report.rendered);
            Ok(if report.outcome.is_valid() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Rules { schema } => {
            print!("{}", list_rules(&schema)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}
