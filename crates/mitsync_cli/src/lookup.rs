//! Application and sandbox name resolution against the directory API.

use anyhow::{Context as _, bail};
use dialoguer::FuzzySelect;
use dialoguer::theme::ColorfulTheme;
use mitsync_api::{Application, Sandbox, ScanRemote};

/// Resolves an application name to its directory record.
///
/// The directory search matches on substrings, so several candidates
/// can come back. A candidate whose profile name equals `name` exactly
/// wins; otherwise an attended terminal gets an interactive chooser
/// when `interactive` is set, and anything else fails listing the
/// candidates.
pub async fn application_by_name<R: ScanRemote>(
    remote: &R,
    name: &str,
    interactive: bool,
) -> anyhow::Result<Application> {
    let mut candidates = remote
        .applications_by_name(name)
        .await
        .with_context(|| format!("searching for application '{name}'"))?;

    if candidates.is_empty() {
        bail!("no application named '{name}' was found");
    }
    if candidates.len() == 1 {
        return Ok(candidates.remove(0));
    }
    if let Some(index) = exact_index(name, &candidates) {
        return Ok(candidates.swap_remove(index));
    }
    if interactive && console::user_attended() {
        let index = choose_application(&candidates)?;
        return Ok(candidates.swap_remove(index));
    }

    bail!(
        "application name '{name}' matches {} profiles: {}",
        candidates.len(),
        candidate_names(&candidates).join(", ")
    );
}

/// Resolves a legacy numeric application id to its directory record.
pub async fn application_by_legacy_id<R: ScanRemote>(
    remote: &R,
    legacy_id: u64,
) -> anyhow::Result<Application> {
    remote
        .application_by_legacy_id(legacy_id)
        .await
        .with_context(|| format!("looking up application id {legacy_id}"))?
        .with_context(|| format!("no application with legacy id {legacy_id} was found"))
}

/// Resolves a sandbox name within an application to its record.
pub async fn sandbox_by_name<R: ScanRemote>(
    remote: &R,
    app: &Application,
    name: &str,
) -> anyhow::Result<Sandbox> {
    let sandboxes = remote
        .sandboxes(&app.guid)
        .await
        .with_context(|| format!("listing sandboxes of application '{}'", app.name()))?;

    sandboxes
        .into_iter()
        .find(|sandbox| sandbox.name == name)
        .with_context(|| format!("no sandbox named '{name}' in application '{}'", app.name()))
}

/// Index of the first candidate whose profile name equals `name`.
fn exact_index(name: &str, candidates: &[Application]) -> Option<usize> {
    candidates.iter().position(|app| app.name() == name)
}

fn candidate_names(candidates: &[Application]) -> Vec<String> {
    candidates
        .iter()
        .map(|app| format!("'{}'", app.name()))
        .collect()
}

fn choose_application(candidates: &[Application]) -> anyhow::Result<usize> {
    let names: Vec<&str> = candidates.iter().map(Application::name).collect();

    FuzzySelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Which application?")
        .items(&names)
        .default(0)
        .interact()
        .context("application selection")
}
