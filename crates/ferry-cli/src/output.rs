//! Terminal output.
//!
//! Human-readable lines go to stdout with a status glyph; failures go to
//! stderr. `--json` modes print one compact record per line.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use ferry_core::ObjectRecord;

pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// A follow-up the user has to act on.
pub fn hint(msg: &str) {
    println!("{} {}", "→".yellow(), msg);
}

/// `label: value`, label dimmed.
pub fn field(label: &str, value: &str) {
    println!("{}: {}", label.dimmed(), value);
}

/// One listing row: key, size in bytes, modification time.
pub fn record(record: &ObjectRecord) {
    let modified = record
        .last_modified
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "-".to_string());
    println!("{}\t{}\t{}", record.key, record.size, modified.dimmed());
}

pub fn json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
