//! UI helpers for consistent output formatting.

use std::time::Duration;

/// Single-character Unicode glyphs used as status indicators.
pub mod indicators {
    /// Error indicator (✖).
    pub const ERROR: &str = "✖";
    /// Warning indicator (⚠).
    pub const WARNING: &str = "⚠";
    /// Informational indicator (ℹ).
    pub const INFO: &str = "ℹ";
    /// Success indicator (✓).
    pub const SUCCESS: &str = "✓";
    /// Addition indicator (+).
    pub const ADDED: &str = "+";
}

/// Semantic colour palette for terminal output.
pub mod colors {
    use console::Style;

    /// Red - errors and fatal failures.
    pub const fn error() -> Style {
        Style::new().red()
    }

    /// Yellow - warnings and partial failures.
    pub const fn warning() -> Style {
        Style::new().yellow()
    }

    /// Cyan - informational messages.
    pub const fn info() -> Style {
        Style::new().cyan()
    }

    /// Green - success messages.
    pub const fn success() -> Style {
        Style::new().green()
    }

    /// Light grey - secondary descriptive text.
    pub const fn secondary() -> Style {
        Style::new().color256(252)
    }

    /// Dark grey - muted/contextual text.
    pub const fn muted() -> Style {
        Style::new().color256(243)
    }

    /// Cyan - accent highlights (application names, commands).
    pub const fn accent() -> Style {
        Style::new().cyan()
    }
}

/// Process exit codes.
pub mod exit {
    /// Some units of work failed; the rest completed.
    pub const PARTIAL: i32 = 1;
    /// An unrecoverable error occurred.
    pub const ERROR: i32 = 2;
}

/// Prints a styled `mitsync <command>` header with surrounding blank lines.
pub fn print_command_header(command: &str) {
    println!();
    println!(
        "{} {}",
        colors::accent().bold().apply_to("mitsync"),
        colors::muted().apply_to(command)
    );
    println!();
}

/// Prints a red error message to stderr.
pub fn print_error(message: &str) {
    eprintln!(
        "{} {}",
        colors::error().apply_to(indicators::ERROR),
        colors::secondary().apply_to(message)
    );
}

/// Prints a yellow warning message to stderr.
pub fn print_warning(message: &str) {
    eprintln!(
        "{} {}",
        colors::warning().apply_to(indicators::WARNING),
        colors::secondary().apply_to(message)
    );
}

/// Prints a cyan informational message to stdout.
pub fn print_info(message: &str) {
    println!(
        "{} {}",
        colors::info().apply_to(indicators::INFO),
        colors::secondary().apply_to(message)
    );
}

/// Returns `singular` when `count` is 1, otherwise `plural`.
#[must_use]
pub const fn pluralise_word<'a>(count: usize, singular: &'a str, plural: &'a str) -> &'a str {
    if count == 1 { singular } else { plural }
}

const MILLIS_PER_SECOND: u128 = 1_000;

/// Formats a duration as a human-readable string (ms below one second,
/// fractional seconds above).
#[must_use]
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis < MILLIS_PER_SECOND {
        format!("{millis}ms")
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}

/// Returns the shared clap colour theme used by all CLI subcommands.
#[must_use]
pub fn clap_styles() -> clap::builder::Styles {
    use clap::builder::styling::{AnsiColor, Effects, Style};

    clap::builder::Styles::styled()
        .header(
            Style::new()
                .fg_color(Some(AnsiColor::Cyan.into()))
                .effects(Effects::BOLD),
        )
        .usage(
            Style::new()
                .fg_color(Some(AnsiColor::Cyan.into()))
                .effects(Effects::BOLD),
        )
        .literal(Style::new().fg_color(Some(AnsiColor::Cyan.into())))
        .placeholder(Style::new().fg_color(Some(AnsiColor::BrightBlack.into())))
        .valid(Style::new().fg_color(Some(AnsiColor::Green.into())))
        .invalid(Style::new().fg_color(Some(AnsiColor::Red.into())))
        .error(
            Style::new()
                .fg_color(Some(AnsiColor::Red.into()))
                .effects(Effects::BOLD),
        )
}
