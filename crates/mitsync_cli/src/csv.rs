//! Applications CSV parsing and writing.
//!
//! The batch command consumes, and the inventory command produces, a
//! two-column CSV pairing application names with sandbox names. Parsing
//! is header-driven, so reordered or extra columns from report exports
//! are tolerated, as are a UTF-8 byte-order mark, quoted fields and
//! CRLF line endings.

use anyhow::Context as _;

/// Column header naming the application profile.
pub const APPLICATION_COLUMN: &str = "Applications Application Name";

/// Column header naming the sandbox.
pub const SANDBOX_COLUMN: &str = "Scans Sandbox Name";

/// Sandbox column sentinel selecting the policy-level scan context.
pub const POLICY_SANDBOX: &str = "Policy Sandbox";

/// One application/sandbox pair from the applications CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRow {
    /// Application profile name.
    pub application: String,
    /// Sandbox name, or [`POLICY_SANDBOX`] for the policy context.
    pub sandbox: String,
}

impl ApplicationRow {
    /// Whether this row targets the policy scan rather than a sandbox.
    #[must_use]
    pub fn is_policy(&self) -> bool {
        self.sandbox == POLICY_SANDBOX
    }
}

/// Parses the applications CSV, locating columns by header name.
///
/// Fields missing from short records come back empty. Blank lines are
/// skipped.
pub fn parse_applications(content: &str) -> anyhow::Result<Vec<ApplicationRow>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut records = split_records(content).into_iter();

    let header = records.next().context("applications CSV is empty")?;
    let application_column = column_index(&header, APPLICATION_COLUMN)?;
    let sandbox_column = column_index(&header, SANDBOX_COLUMN)?;

    Ok(records
        .map(|fields| ApplicationRow {
            application: field_at(&fields, application_column),
            sandbox: field_at(&fields, sandbox_column),
        })
        .collect())
}

/// Formats rows as the applications CSV, header first.
#[must_use]
pub fn format_applications(rows: &[ApplicationRow]) -> String {
    let mut out = String::new();
    out.push_str(APPLICATION_COLUMN);
    out.push(',');
    out.push_str(SANDBOX_COLUMN);
    out.push('\n');
    for row in rows {
        out.push_str(&escape_field(&row.application));
        out.push(',');
        out.push_str(&escape_field(&row.sandbox));
        out.push('\n');
    }
    out
}

fn column_index(header: &[String], name: &str) -> anyhow::Result<usize> {
    header
        .iter()
        .position(|column| column.trim() == name)
        .with_context(|| format!("applications CSV has no '{name}' column"))
}

fn field_at(fields: &[String], index: usize) -> String {
    fields.get(index).cloned().unwrap_or_default()
}

fn escape_field(value: &str) -> String {
    if value.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Splits CSV content into records of fields, honouring quoting.
///
/// A quoted field may contain commas, doubled quotes and line breaks.
fn split_records(content: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                finish_record(&mut records, &mut record, &mut field);
            }
            '\n' => finish_record(&mut records, &mut record, &mut field),
            _ => field.push(c),
        }
    }
    finish_record(&mut records, &mut record, &mut field);

    records
}

fn finish_record(records: &mut Vec<Vec<String>>, record: &mut Vec<String>, field: &mut String) {
    if record.is_empty() && field.is_empty() {
        return;
    }
    record.push(std::mem::take(field));
    records.push(std::mem::take(record));
}
