use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Priority of a branch requisition.
/// Higher values are surfaced first in the approval queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    /// Routine replenishment (0)
    #[default]
    Normal = 0,
    /// Stock-out or patient-critical (100)
    Urgent = 100,
}

impl Priority {
    /// Get the numeric priority value
    pub fn value(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::Urgent => "URGENT",
            Priority::Normal => "NORMAL",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "URGENT" => Ok(Priority::Urgent),
            "NORMAL" => Ok(Priority::Normal),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}
