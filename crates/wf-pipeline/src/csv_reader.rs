//! Strict CSV parsing into a [`RawFrame`]
//!
//! The first record is the header and is kept verbatim, whitespace included.
//! Every following record must have exactly as many fields as the header.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use wf_core::RawFrame;

use crate::error::{PipelineError, PipelineResult};

/// Read `path` into a typed frame
pub fn read_frame(path: &Path, delimiter: char) -> PipelineResult<RawFrame> {
    let parse_error = |message: String| PipelineError::Parse {
        path: path.display().to_string(),
        message,
    };

    if !delimiter.is_ascii() {
        return Err(parse_error(format!(
            "delimiter {:?} is not a single-byte character",
            delimiter
        )));
    }

    let metadata = fs::metadata(path).map_err(|e| parse_error(e.to_string()))?;
    if metadata.len() == 0 {
        return Err(parse_error("file is empty, a header row is required".to_string()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .delimiter(delimiter as u8)
        .from_path(path)
        .map_err(|e| parse_error(e.to_string()))?;

    let header: Vec<String> = reader
        .headers()
        .map_err(|e| parse_error(e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();
    validate_header(&header).map_err(parse_error)?;

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| parse_error(e.to_string()))?;
        records.push(record.iter().map(str::to_string).collect());
    }

    Ok(RawFrame::from_text_records(header, records))
}

fn validate_header(header: &[String]) -> Result<(), String> {
    if header.is_empty() {
        return Err("header row has no columns".to_string());
    }

    let mut seen = HashSet::new();
    for (idx, name) in header.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(format!("column {} has an empty name", idx + 1));
        }
        if !seen.insert(name.as_str()) {
            return Err(format!("duplicate column name '{}'", name));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "csv_reader_test.rs"]
mod tests;
