//! Inventory command - exports the applications CSV the batch command
//! reads, one row per scan context.

use std::fs;

use anyhow::Context as _;
use console::style;

use crate::InventoryArgs;
use crate::csv::{self, ApplicationRow};
use crate::session::{self, Session};
use crate::ui::{self, colors, indicators, pluralise_word};

/// Executes the `mitsync inventory` command.
pub fn run(args: &InventoryArgs) -> super::Result {
    if args.output.is_some() {
        ui::print_command_header("inventory");
    }

    let session = Session::open(args.config.as_deref())?;
    let runtime = session::build_runtime()?;

    let rows = runtime.block_on(collect_rows(&session))?;
    let content = csv::format_applications(&rows);

    match &args.output {
        Some(path) => {
            fs::write(path, &content).with_context(|| format!("writing '{}'", path.display()))?;
            println!(
                "{} {} {}",
                colors::success().apply_to(indicators::ADDED),
                style(path.display()).bold(),
                colors::muted().apply_to(format!(
                    "({} {})",
                    rows.len(),
                    pluralise_word(rows.len(), "row", "rows")
                ))
            );
        }
        None => print!("{content}"),
    }

    Ok(())
}

/// Lists every application with a policy row followed by one row per
/// sandbox, in directory order.
async fn collect_rows(session: &Session) -> anyhow::Result<Vec<ApplicationRow>> {
    session::warn_expiring_credentials(&session.client).await;

    let applications = session
        .client
        .applications()
        .await
        .context("listing applications")?;

    let mut rows = Vec::new();
    for application in &applications {
        rows.push(ApplicationRow {
            application: application.name().to_string(),
            sandbox: csv::POLICY_SANDBOX.to_string(),
        });

        let sandboxes = session
            .client
            .sandboxes(&application.guid)
            .await
            .with_context(|| format!("listing sandboxes of '{}'", application.name()))?;
        for sandbox in sandboxes {
            rows.push(ApplicationRow {
                application: application.name().to_string(),
                sandbox: sandbox.name,
            });
        }
    }

    Ok(rows)
}
