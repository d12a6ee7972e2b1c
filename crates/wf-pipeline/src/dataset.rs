//! Typed handoff between the extract and load steps

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// A dataset path that passed validation.
///
/// Only [`crate::PathValidator`] constructs one, so holding a handle means
/// the file existed when it was checked. The file is not re-checked when the
/// handle is consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetHandle {
    path: PathBuf,
    size_bytes: u64,
    validated_at: DateTime<Utc>,
}

impl DatasetHandle {
    pub(crate) fn new(path: PathBuf, size_bytes: u64) -> Self {
        Self {
            path,
            size_bytes,
            validated_at: Utc::now(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File size at validation time
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn validated_at(&self) -> DateTime<Utc> {
        self.validated_at
    }
}
