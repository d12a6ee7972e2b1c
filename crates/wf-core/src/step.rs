//! Step identifiers for the extract → load → transform chain

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three ordered units of work in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepId {
    /// Confirm the dataset exists
    Extract,
    /// Replace the raw table with the dataset contents
    Load,
    /// Run the transform script over the raw table
    Transform,
}

impl StepId {
    /// All steps in execution order
    pub const ALL: [StepId; 3] = [StepId::Extract, StepId::Load, StepId::Transform];

    /// The step that must be Done before this one may start
    pub fn predecessor(&self) -> Option<StepId> {
        match self {
            StepId::Extract => None,
            StepId::Load => Some(StepId::Extract),
            StepId::Transform => Some(StepId::Load),
        }
    }

    /// Steps that run after this one
    pub fn downstream(&self) -> &'static [StepId] {
        match self {
            StepId::Extract => &[StepId::Load, StepId::Transform],
            StepId::Load => &[StepId::Transform],
            StepId::Transform => &[],
        }
    }

    /// Task identifier used in logs and run files
    pub fn task_id(&self) -> &'static str {
        match self {
            StepId::Extract => "extract_hdhi",
            StepId::Load => "load_raw_hdhi",
            StepId::Transform => "transform_hdhi",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::Extract => "extract",
            StepId::Load => "load",
            StepId::Transform => "transform",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
