//! Copy command - replays approved mitigations from one scan context
//! onto another.

use std::time::Instant;

use console::style;
use mitsync_api::{ApiClient, Application};
use mitsync_core::{AppContext, ConsumedSet, SyncOptions, Syncer, fetch_findings_with_retry};

use crate::session::{self, Session};
use crate::ui::{self, colors, indicators, pluralise_word};
use crate::{CopyArgs, lookup};

/// Executes the `mitsync copy` command.
pub fn run(args: &CopyArgs) -> super::Result {
    ui::print_command_header("copy");

    let session = Session::open(args.config.as_deref())?;
    let runtime = session::build_runtime()?;

    runtime.block_on(execute(&session, args))
}

async fn execute(session: &Session, args: &CopyArgs) -> super::Result {
    session::warn_expiring_credentials(&session.client).await;

    if args.dry_run {
        ui::print_info("dry run, not making any changes");
    }

    let remote = &session.client;
    let scan_type = args.scan_type.scan_type();

    let from_app = resolve_app(remote, args.from_app.as_deref(), args.from_app_id).await?;
    let to_app = resolve_app(remote, args.to_app.as_deref(), args.to_app_id).await?;
    let from = build_context(remote, &from_app, args.from_sandbox.as_deref()).await?;
    let to = build_context(remote, &to_app, args.to_sandbox.as_deref()).await?;

    let options = SyncOptions {
        dry_run: args.dry_run,
        propose_only: args.propose_only,
        allow_fuzzy: args.fuzzy,
        line_tolerance: session.config.line_tolerance,
        issue_filter: (!args.ids.is_empty()).then(|| args.ids.iter().copied().collect()),
    };
    let retry = session.config.retry.to_policy();
    let syncer = Syncer::new(remote).with_options(options).with_retry_policy(retry);

    let start = Instant::now();

    ui::print_info(&format!("getting {scan_type} findings for {}", from.describe()));
    let from_findings = fetch_findings_with_retry(remote, &from, scan_type, &retry).await?;
    ui::print_info(&format!(
        "found {} {scan_type} {} in \"from\" {}",
        from_findings.len(),
        pluralise_word(from_findings.len(), "finding", "findings"),
        from.describe()
    ));

    let mut consumed = ConsumedSet::new();
    let copied = syncer
        .sync_findings(&from_findings, &from, &to, scan_type, &mut consumed)
        .await?;

    println!();
    println!(
        "{} updated {} {} in {} {}",
        colors::success().apply_to(indicators::SUCCESS),
        style(copied).bold(),
        pluralise_word(copied as usize, "flaw", "flaws"),
        colors::secondary().apply_to(to.describe()),
        colors::muted().apply_to(format!("({})", ui::format_duration(start.elapsed())))
    );

    Ok(())
}

async fn resolve_app(
    remote: &ApiClient,
    name: Option<&str>,
    legacy_id: Option<u64>,
) -> anyhow::Result<Application> {
    match (name, legacy_id) {
        (Some(name), _) => lookup::application_by_name(remote, name, true).await,
        (None, Some(id)) => lookup::application_by_legacy_id(remote, id).await,
        (None, None) => anyhow::bail!("an application name or legacy id is required"),
    }
}

async fn build_context(
    remote: &ApiClient,
    app: &Application,
    sandbox: Option<&str>,
) -> anyhow::Result<AppContext> {
    let context = match sandbox {
        Some(name) => {
            let sandbox = lookup::sandbox_by_name(remote, app, name).await?;
            AppContext::sandbox(app.guid.as_str(), sandbox.guid)
        }
        None => AppContext::application(app.guid.as_str()),
    };

    Ok(context.with_name(app.name()))
}
