use clap::{Parser, Subcommand};
use mtr_auditor::{check, AuditConfig, CheckOptions, DEFAULT_CONFIG_FILE};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mtr-audit")]
#[command(about = "Verifies Manual Test Records against the state of their git repositories")]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    configuration: PathBuf,

    /// Suppresses all terminal output (except for critical errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verifies the MTRs found below PATH (defaults to the configured path,
    /// then to the current working directory)
    Check {
        path: Option<PathBuf>,
        /// Exports the results to the given file; the format is deduced from
        /// its extension. Can be repeated.
        #[arg(short, long)]
        export: Vec<PathBuf>,
        /// PATH holds several repositories instead of being one. Every MTR
        /// then needs a 'repos' attribute.
        #[arg(short, long)]
        multi_repo: bool,
    },
    /// Prints the version
    Version {
        /// Only print the version number
        #[arg(short, long)]
        number_only: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "error" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Version { number_only } => {
            print_version(number_only);
            ExitCode::SUCCESS
        }
        Commands::Check {
            path,
            export,
            multi_repo,
        } => run_check(
            &cli.configuration,
            CheckOptions {
                path,
                export,
                multi_repo,
            },
        ),
    }
}

fn run_check(configuration: &Path, options: CheckOptions) -> ExitCode {
    info!("Loading configuration file {}...", configuration.display());

    let result = AuditConfig::load(configuration)
        .map_err(mtr_auditor::AuditError::Config)
        .and_then(|config| check(&config, &options));

    match result {
        Ok(report) => {
            info!(
                "{} record(s) verified, {} file(s) rejected",
                report.records.len(),
                report.failures.len()
            );
            exit_code(report.exit_code())
        }
        Err(error) => {
            error!("Error: {error}");
            exit_code(error.exit_code())
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(u8::MAX))
}

fn print_version(number_only: bool) {
    let version = env!("CARGO_PKG_VERSION");
    if number_only {
        println!("{version}");
    } else {
        println!("mtr-audit {version}");
    }
}
