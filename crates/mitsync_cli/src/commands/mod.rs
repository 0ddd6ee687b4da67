//! CLI command handlers.

/// CSV-driven self-copy across many scan contexts.
pub mod batch;
/// One-shot mitigation copy between two scan contexts.
pub mod copy;
/// Applications and sandboxes CSV export.
pub mod inventory;

/// Convenience alias for command return types.
pub type Result<T = ()> = anyhow::Result<T>;
