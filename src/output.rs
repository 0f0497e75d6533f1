//! Output formatting and export for run summaries and stored results.
//!
//! Supports pretty-printing, JSON serialization, and CSV append.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::correlation::ClassificationResult;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Logs any value using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl std::fmt::Debug) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends [`ClassificationResult`] rows to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_results(path: &str, results: &[ClassificationResult]) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = results.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for result in results {
        writer.serialize(result)?;
    }
    writer.flush()?;

    Ok(())
}
