//! turnup command line entry point.

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{LevelFilter, error, info};
use std::error::Error as _;
use std::io::Write as _;
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use turnup::commands::app::{self, AppError, PlatformKind};
use turnup::commands::update::{UpdateOptions, UpdateOutcome};
use turnup::config::Config;

/// Top-level error type for the turnup CLI binary.
#[derive(Debug, Error)]
enum TurnupError {
    /// Command orchestration failed.
    #[error(transparent)]
    App(#[from] AppError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Command line arguments.
#[derive(Parser)]
#[command(name = "turnup")]
#[command(about = "CLI to update a package dependency across many repositories", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./turnup.toml when present).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Update one package to a version in every repository that depends on it.
    Update {
        /// Package and target version (e.g., lodash@4.17.21).
        #[arg(value_name = "PACKAGE@VERSION")]
        package: String,

        /// Run options.
        #[command(flatten)]
        options: RunArgs,
    },
    /// Update every dependency in every selected repository.
    UpdateAll {
        /// Run options.
        #[command(flatten)]
        options: RunArgs,
    },
}

/// Hosting platform accepted on the command line.
#[derive(Clone, Copy, ValueEnum)]
enum PlatformArg {
    /// github.com or a Github Enterprise server.
    Github,
}

/// Options shared by both subcommands.
#[derive(Args)]
struct RunArgs {
    /// Repository to consider, as OWNER/NAME (repeatable).
    #[arg(short, long = "repo", value_name = "OWNER/NAME")]
    repositories: Vec<String>,

    /// User or organization whose repositories are considered.
    #[arg(short, long)]
    owner: Option<String>,

    /// Hosting platform.
    #[arg(long, value_enum, default_value = "github")]
    platform: PlatformArg,

    /// Do not regenerate lockfiles.
    #[arg(long)]
    no_lockfile: bool,

    /// Do not open pull requests.
    #[arg(long)]
    no_pull_request: bool,

    /// Update every candidate without asking.
    #[arg(short = 'y', long = "continue")]
    skip_selection: bool,

    /// Registry used when regenerating lockfiles.
    #[arg(long, value_name = "URL")]
    registry: Option<String>,
}

impl RunArgs {
    /// Separate the platform choice from the run options.
    fn split(self) -> (PlatformKind, UpdateOptions) {
        let platform = match self.platform {
            PlatformArg::Github => PlatformKind::Github,
        };
        let options = UpdateOptions {
            repositories: self.repositories,
            owner: self.owner,
            no_lockfile: self.no_lockfile,
            no_pull_request: self.no_pull_request,
            skip_selection: self.skip_selection,
            registry: self.registry,
        };
        (platform, options)
    }
}

/// Parse arguments, run, and report failures with their causes.
fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(&cli);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            let mut source = e.source();
            while let Some(cause) = source {
                error!("caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}

/// Load configuration and dispatch the chosen subcommand.
fn run(cli: Cli) -> Result<(), TurnupError> {
    let cwd = std::env::current_dir()?;
    let config = Config::load(cli.config.as_deref(), &cwd).map_err(AppError::from)?;

    let outcome = match cli.command {
        Commands::Update { package, options } => {
            let (platform, update_options) = options.split();
            app::update(&config, platform, &package, update_options)?
        }
        Commands::UpdateAll { options } => {
            let (platform, update_options) = options.split();
            app::update_all(&config, platform, update_options)?
        }
    };

    print_outcome(&outcome);
    Ok(())
}

/// Log a summary of what the run did.
fn print_outcome(outcome: &UpdateOutcome) {
    match outcome {
        UpdateOutcome::UpToDate => info!("Nothing to update."),
        UpdateOutcome::NothingSelected => info!("Nothing was updated."),
        UpdateOutcome::Published(reports) => {
            for report in reports {
                match &report.pull_request {
                    Some(pr) => info!("{}: {pr}", report.repository),
                    None => info!("{}: pushed {}", report.repository, report.branch),
                }
            }
        }
    }
}

/// Initialize logging based on the verbosity level specified in the CLI.
fn init_logging(cli: &Cli) {
    let mut builder = env_logger::builder();
    builder
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .format(|buf, record| {
            let level = record.level();
            let style = &buf.default_level_style(level);
            writeln!(buf, "[{style}{level}{style:#}] {}", record.args())
        });

    if !cli.verbose {
        builder.format_timestamp(None);
    }

    builder.init();
}
