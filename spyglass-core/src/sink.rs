// Serialization of the result set to disk

use crate::error::{CoreError, Result};
use serde::Serialize;
use spyglass_scanner::PageRecord;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            other => Err(CoreError::UnsupportedFormat(other.to_string())),
        }
    }
}

const CSV_HEADER: [&str; 9] = [
    "URL",
    "Links",
    "JS Files",
    "Forms",
    "Subdomains",
    "JS Endpoints",
    "Technologies",
    "Headers",
    "Parameters",
];

pub fn save_results(results: &[PageRecord], path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => save_json(results, path)?,
        OutputFormat::Csv => save_csv(results, path)?,
    }
    info!("Wrote {} records to {}", results.len(), path.display());
    Ok(())
}

/// Pretty-printed JSON array. An empty result set is written as `[]`.
pub fn save_json(results: &[PageRecord], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(results)?;
    fs::write(path, json)?;
    Ok(())
}

/// One row per record. Lists are joined with `, ` and nested objects are
/// embedded as JSON text. A `Filtered` column is added when any record has
/// category buckets.
pub fn save_csv(results: &[PageRecord], path: &Path) -> Result<()> {
    let with_filtered = results.iter().any(|r| r.filtered.is_some());
    let mut writer = csv::Writer::from_path(path)?;

    let mut header: Vec<&str> = CSV_HEADER.to_vec();
    if with_filtered {
        header.push("Filtered");
    }
    writer.write_record(&header)?;

    for record in results {
        let mut row = vec![
            record.url.clone(),
            record.links.join(", "),
            record.js_files.join(", "),
            json_text(&record.forms)?,
            record.subdomains.join(", "),
            record.js_endpoints.join(", "),
            record.technologies.join(", "),
            json_text(&record.headers)?,
            record.parameters.join(", "),
        ];
        if with_filtered {
            row.push(match record.filtered {
                Some(ref filtered) => json_text(filtered)?,
                None => String::new(),
            });
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

fn json_text<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}
