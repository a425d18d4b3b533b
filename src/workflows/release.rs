// Release workflow: unlock quarantined stock for sale

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::Result;
use super::gate::{self, GateStatus};
use super::types::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReleaseRequest {
    pub id: RequestId,
    pub branch_id: BranchId,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub items: Vec<LineItem>,
    pub status: GateStatus,
    pub history: Vec<StatusChange<GateStatus>>,
    pub version: u64,
}

impl ReleaseRequest {
    /// Item reasons are optional for a release
    pub fn request(
        branch_id: BranchId,
        requested_by: &str,
        items: Vec<LineItem>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        validate_items(&items)?;
        Ok(Self {
            id: RequestId::new(),
            branch_id,
            requested_by: requested_by.to_string(),
            requested_at: now,
            items,
            status: GateStatus::Pending,
            history: gate::opened(requested_by, now),
            version: 0,
        })
    }

    pub fn authorize(&self, actor: &str, now: DateTime<Utc>) -> Result<Self> {
        let mut next = self.clone();
        gate::authorize(
            self.id,
            &mut next.status,
            &mut next.history,
            WorkflowAction::AuthorizeRelease,
            actor,
            now,
        )?;
        Ok(next)
    }
}

impl WorkflowRecord for ReleaseRequest {
    const KIND: &'static str = "release";

    fn id(&self) -> RequestId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn bump_version(&mut self) {
        self.version += 1;
    }

    fn branch_id(&self) -> &BranchId {
        &self.branch_id
    }

    fn status_label(&self) -> &'static str {
        self.status.label()
    }

    fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn items(&self) -> &[LineItem] {
        &self.items
    }

    fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }
}
