//! # Commands
//!
//! - `mitsync copy` - Copy approved mitigations between two scan contexts
//! - `mitsync batch` - Re-apply mitigations across a CSV of scan contexts
//! - `mitsync inventory` - Export the applications CSV the batch command reads

mod commands;
mod csv;
mod lookup;
mod session;
mod ui;

use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use console::style;
use mitsync_api::ScanType;

use crate::ui::colors;

const REPO_URL: &str = "https://github.com/mitsync/mitsync";

/// Fallback log filter when `RUST_LOG` is unset: progress from the
/// mitsync crates only.
const DEFAULT_LOG_FILTER: &str = "mitsync_api=info,mitsync_cli=info,mitsync_core=info";

#[derive(Debug, Parser)]
#[command(
    name = "mitsync",
    version,
    styles = ui::clap_styles(),
    arg_required_else_help = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(visible_alias = "c")]
    Copy(CopyArgs),

    #[command(visible_alias = "b")]
    Batch(BatchArgs),

    #[command(visible_alias = "i")]
    Inventory(InventoryArgs),
}

/// Scan type selector for copy and batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ScanTypeArg {
    /// Static analysis findings.
    #[default]
    Static,
    /// Dynamic analysis findings.
    Dynamic,
}

impl ScanTypeArg {
    /// The wire-level scan type this flag selects.
    #[must_use]
    pub const fn scan_type(self) -> ScanType {
        match self {
            Self::Static => ScanType::Static,
            Self::Dynamic => ScanType::Dynamic,
        }
    }
}

/// Arguments for the `mitsync copy` command.
#[derive(Debug, Parser)]
pub struct CopyArgs {
    /// Name of the application to copy mitigations from.
    #[arg(
        long,
        value_name = "NAME",
        required_unless_present = "from_app_id",
        conflicts_with = "from_app_id"
    )]
    pub from_app: Option<String>,

    /// Legacy numeric id of the application to copy mitigations from.
    #[arg(long, value_name = "ID")]
    pub from_app_id: Option<u64>,

    /// Copy from this sandbox instead of the policy scan.
    #[arg(long, value_name = "NAME")]
    pub from_sandbox: Option<String>,

    /// Name of the application to copy mitigations to.
    #[arg(
        long,
        value_name = "NAME",
        required_unless_present = "to_app_id",
        conflicts_with = "to_app_id"
    )]
    pub to_app: Option<String>,

    /// Legacy numeric id of the application to copy mitigations to.
    #[arg(long, value_name = "ID")]
    pub to_app_id: Option<u64>,

    /// Copy into this sandbox instead of the policy scan.
    #[arg(long, value_name = "NAME")]
    pub to_sandbox: Option<String>,

    /// Scan type to copy mitigations for.
    #[arg(long, value_enum, default_value_t)]
    pub scan_type: ScanTypeArg,

    /// Copy only the source findings with these issue ids.
    #[arg(long = "id", value_name = "N")]
    pub ids: Vec<u32>,

    /// Copy approvals as proposals instead of applying them.
    #[arg(long)]
    pub propose_only: bool,

    /// Log matched flaws instead of applying mitigations.
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Look within a range of line numbers for a matching flaw.
    #[arg(long)]
    pub fuzzy: bool,

    /// Path to `mitsync.toml` configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Show debug information.
    #[arg(short = 'D', long)]
    pub debug: bool,
}

/// Arguments for the `mitsync batch` command.
#[derive(Debug, Parser)]
pub struct BatchArgs {
    /// Applications CSV listing the scan contexts to self-copy.
    #[arg(long, value_name = "PATH", default_value = "applications.csv")]
    pub csv: PathBuf,

    /// Scan type to copy mitigations for.
    #[arg(long, value_enum, default_value_t)]
    pub scan_type: ScanTypeArg,

    /// Log matched flaws instead of applying mitigations.
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Look within a range of line numbers for a matching flaw.
    #[arg(long)]
    pub fuzzy: bool,

    /// Path to `mitsync.toml` configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Show debug information.
    #[arg(short = 'D', long)]
    pub debug: bool,
}

/// Arguments for the `mitsync inventory` command.
#[derive(Debug, Parser)]
pub struct InventoryArgs {
    /// Write the CSV to a file instead of stdout.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Path to `mitsync.toml` configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Show debug information.
    #[arg(short = 'D', long)]
    pub debug: bool,
}

fn main() {
    let cli = parse_cli();

    init_tracing(wants_debug(&cli.command));

    if let Err(e) = run(cli.command) {
        ui::print_error(&format!("{e:#}"));
        std::process::exit(ui::exit::ERROR);
    }
}

/// Whether the parsed command asked for debug logging.
const fn wants_debug(command: &Command) -> bool {
    match command {
        Command::Copy(args) => args.debug,
        Command::Batch(args) => args.debug,
        Command::Inventory(args) => args.debug,
    }
}

fn init_tracing(debug: bool) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let fallback = if debug { "debug" } else { DEFAULT_LOG_FILTER };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}

fn parse_cli() -> Cli {
    let cmd = Cli::command().about(build_about()).after_help(build_after_help());

    let matches = cmd.get_matches();

    #[expect(clippy::expect_used, reason = "clap already validated args; this cannot fail")]
    Cli::from_arg_matches(&matches).expect("failed to parse arguments")
}

fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Copy(args) => commands::copy::run(&args),
        Command::Batch(args) => commands::batch::run(&args),
        Command::Inventory(args) => commands::inventory::run(&args),
    }
}

fn build_about() -> String {
    format!(
        r"
  {} copies approved mitigation annotations between Veracode scan
  result sets, matching findings by CWE and location and replaying
  their comment and approval history.",
        colors::accent().apply_to("mitsync").bold()
    )
}

fn build_after_help() -> String {
    format!(
        r"
  {}
    mitsync copy --from-app A --to-app B           Copy between applications
    mitsync copy --from-app A --to-app B --fuzzy   Tolerate small line drift
    mitsync batch                                  Self-copy contexts from applications.csv
    mitsync batch --dry-run                        Preview without posting
    mitsync inventory --output applications.csv    Export the batch CSV

  Learn more: {}",
        style("Examples:").bold(),
        colors::accent().apply_to(REPO_URL).underlined()
    )
}
