//! SHA-256 checksums for change detection between runs.

use crate::config::Config;
use sha2::{Digest, Sha256};

/// Compute SHA256 checksum of a string
pub fn compute_checksum(s: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Fingerprint of the settings that change what a run produces.
///
/// Stored on every run so the history shows when the pipeline definition
/// changed between two runs.
pub fn config_fingerprint(config: &Config) -> String {
    let derived: Vec<&str> = config
        .transform
        .derived_tables
        .iter()
        .map(|t| t.as_str())
        .collect();
    let material = format!(
        "{}|{}|{}|{}|{}|{}",
        config.name,
        config.dataset.path,
        config.database.raw_table,
        config.transform.sql_path,
        derived.join(","),
        config.dataset.allow_empty,
    );
    compute_checksum(&material)[..16].to_string()
}
