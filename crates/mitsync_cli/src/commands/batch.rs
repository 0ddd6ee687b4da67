//! Batch command - self-copies every scan context listed in an
//! applications CSV, so re-scanned findings regain their mitigations.

use std::fs;
use std::time::{Duration, Instant};

use anyhow::Context as _;
use console::style;
use mitsync_api::{ApiClient, ScanType};
use mitsync_core::{
    AppContext, ConsumedSet, RetryPolicy, SyncOptions, Syncer, fetch_findings_with_retry,
};

use crate::csv::{self, ApplicationRow};
use crate::session::{self, Session};
use crate::ui::{self, colors, indicators, pluralise_word};
use crate::{BatchArgs, lookup};

/// Executes the `mitsync batch` command.
pub fn run(args: &BatchArgs) -> super::Result {
    ui::print_command_header("batch");

    let content = fs::read_to_string(&args.csv)
        .with_context(|| format!("reading applications CSV '{}'", args.csv.display()))?;
    let rows = csv::parse_applications(&content)?;

    if rows.is_empty() {
        ui::print_info("applications CSV has no rows, nothing to do");
        return Ok(());
    }

    let session = Session::open(args.config.as_deref())?;
    let runtime = session::build_runtime()?;

    let failed_rows = runtime.block_on(execute(&session, args, &rows))?;

    if failed_rows > 0 {
        std::process::exit(ui::exit::PARTIAL);
    }
    Ok(())
}

async fn execute(
    session: &Session,
    args: &BatchArgs,
    rows: &[ApplicationRow],
) -> anyhow::Result<u32> {
    session::warn_expiring_credentials(&session.client).await;

    if args.dry_run {
        ui::print_info("dry run, not making any changes");
    }

    let scan_type = args.scan_type.scan_type();
    let options = SyncOptions {
        dry_run: args.dry_run,
        propose_only: false,
        allow_fuzzy: args.fuzzy,
        line_tolerance: session.config.line_tolerance,
        issue_filter: None,
    };
    let retry = session.config.retry.to_policy();

    let start = Instant::now();
    let mut copied_total = 0u32;
    let mut failed_rows = 0u32;

    for row in rows {
        match sync_row(&session.client, row, scan_type, &options, retry).await {
            Ok(copied) => copied_total += copied,
            Err(error) => {
                ui::print_error(&format!("{}: {error:#}", row.application));
                failed_rows += 1;
            }
        }
    }

    print_summary(copied_total, rows.len(), failed_rows, start.elapsed());

    Ok(failed_rows)
}

/// Self-copies one row's scan context. Lookup and fetch failures fail
/// the row, not the batch.
async fn sync_row(
    remote: &ApiClient,
    row: &ApplicationRow,
    scan_type: ScanType,
    options: &SyncOptions,
    retry: RetryPolicy,
) -> anyhow::Result<u32> {
    let app = lookup::application_by_name(remote, &row.application, false).await?;

    let context = if row.is_policy() {
        AppContext::application(app.guid.as_str())
    } else {
        let sandbox = lookup::sandbox_by_name(remote, &app, &row.sandbox).await?;
        AppContext::sandbox(app.guid.as_str(), sandbox.guid)
    }
    .with_name(app.name());

    ui::print_info(&format!("getting {scan_type} findings for {}", context.describe()));
    let findings = fetch_findings_with_retry(remote, &context, scan_type, &retry).await?;
    ui::print_info(&format!(
        "found {} {scan_type} {}",
        findings.len(),
        pluralise_word(findings.len(), "finding", "findings")
    ));

    let syncer = Syncer::new(remote)
        .with_options(options.clone())
        .with_retry_policy(retry);
    let mut consumed = ConsumedSet::new();
    let copied = syncer
        .sync_findings(&findings, &context, &context, scan_type, &mut consumed)
        .await?;

    println!(
        "{} updated {} {} in {}",
        colors::success().apply_to(indicators::SUCCESS),
        style(copied).bold(),
        pluralise_word(copied as usize, "flaw", "flaws"),
        colors::secondary().apply_to(context.describe())
    );

    Ok(copied)
}

fn print_summary(copied: u32, rows: usize, failed_rows: u32, elapsed: Duration) {
    println!();
    println!(
        "{} updated {} {} across {} {} {}",
        colors::success().apply_to(indicators::SUCCESS),
        style(copied).bold(),
        pluralise_word(copied as usize, "flaw", "flaws"),
        rows,
        pluralise_word(rows, "row", "rows"),
        colors::muted().apply_to(format!("({})", ui::format_duration(elapsed)))
    );

    if failed_rows > 0 {
        ui::print_warning(&format!(
            "{failed_rows} {} failed, see errors above",
            pluralise_word(failed_rows as usize, "row", "rows")
        ));
    }
}
