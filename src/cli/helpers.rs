//! Shared helper functions for CLI commands
//!
//! This module contains formatting utilities used across multiple command
//! modules.

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::io::Write;

/// Truncate a string to max_len characters, adding "..." if truncated
///
/// Counts characters, not bytes, so accented labels never split mid-char.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Dash placeholder for empty cells
pub fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() {
        "-"
    } else {
        s
    }
}

/// Serialize rows as CSV with a header taken from the field names
pub fn write_csv<S, W>(rows: &[S], out: W) -> Result<()>
where
    S: Serialize,
    W: Write,
{
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(row).into_diagnostic()?;
    }
    writer.flush().into_diagnostic()?;
    Ok(())
}

/// Render rows as a markdown table
pub fn markdown_table<I, R>(header: &[&str], rows: I) -> String
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = String>,
{
    let mut builder = tabled::builder::Builder::default();
    builder.push_record(header.iter().map(|h| h.to_string()));
    for row in rows {
        builder.push_record(row);
    }
    builder
        .build()
        .with(tabled::settings::Style::markdown())
        .to_string()
}
