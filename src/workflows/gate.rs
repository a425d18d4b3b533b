// Single-step authorization gate shared by release and disposal requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::WorkflowError;
use super::types::{RequestId, StatusChange, WorkflowAction};

/// PENDING -> AUTHORIZED. There is no way back to PENDING.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateStatus {
    Pending,
    Authorized,
}

impl GateStatus {
    pub fn label(self) -> &'static str {
        match self {
            GateStatus::Pending => "PENDING",
            GateStatus::Authorized => "AUTHORIZED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, GateStatus::Authorized)
    }
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Move a gate from PENDING to AUTHORIZED, recording who did it
pub(crate) fn authorize(
    request_id: RequestId,
    status: &mut GateStatus,
    history: &mut Vec<StatusChange<GateStatus>>,
    action: WorkflowAction,
    actor: &str,
    now: DateTime<Utc>,
) -> Result<(), WorkflowError> {
    if *status != GateStatus::Pending {
        return Err(WorkflowError::InvalidStateTransition {
            request_id,
            from: status.label(),
            action,
        });
    }
    *status = GateStatus::Authorized;
    history.push(StatusChange {
        status: GateStatus::Authorized,
        entered_at: now,
        actor: actor.to_string(),
    });
    Ok(())
}

pub(crate) fn opened(actor: &str, now: DateTime<Utc>) -> Vec<StatusChange<GateStatus>> {
    vec![StatusChange {
        status: GateStatus::Pending,
        entered_at: now,
        actor: actor.to_string(),
    }]
}
