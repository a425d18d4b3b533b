// Requisition workflow: PENDING -> APPROVED | REJECTED

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::error::{Result, WorkflowError};
use super::types::*;
use crate::priority::Priority;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequisitionStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequisitionStatus {
    pub fn label(self) -> &'static str {
        match self {
            RequisitionStatus::Pending => "PENDING",
            RequisitionStatus::Approved => "APPROVED",
            RequisitionStatus::Rejected => "REJECTED",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, RequisitionStatus::Pending)
    }
}

impl fmt::Display for RequisitionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Central authority's decision on a requisition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Approved,
    Rejected,
}

impl From<Decision> for RequisitionStatus {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Approved => RequisitionStatus::Approved,
            Decision::Rejected => RequisitionStatus::Rejected,
        }
    }
}

/// A branch's request to receive stock from central supply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requisition {
    pub id: RequestId,
    pub branch_id: BranchId,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub items: Vec<LineItem>,
    pub priority: Priority,
    pub status: RequisitionStatus,
    pub history: Vec<StatusChange<RequisitionStatus>>,
    pub version: u64,
}

impl Requisition {
    /// Create a PENDING requisition. Fails with `EmptyItemSet` if there are no items.
    pub fn submit(
        branch_id: BranchId,
        requested_by: &str,
        items: Vec<LineItem>,
        priority: Priority,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        validate_items(&items)?;
        Ok(Self {
            id: RequestId::new(),
            branch_id,
            requested_by: requested_by.to_string(),
            requested_at: now,
            items,
            priority,
            status: RequisitionStatus::Pending,
            history: vec![StatusChange {
                status: RequisitionStatus::Pending,
                entered_at: now,
                actor: requested_by.to_string(),
            }],
            version: 0,
        })
    }

    /// Apply a decision. Only a PENDING requisition can be decided.
    pub fn decide(&self, decision: Decision, actor: &str, now: DateTime<Utc>) -> Result<Self> {
        if self.status != RequisitionStatus::Pending {
            return Err(WorkflowError::InvalidStateTransition {
                request_id: self.id,
                from: self.status.label(),
                action: WorkflowAction::DecideRequisition,
            });
        }

        let status = RequisitionStatus::from(decision);
        let mut next = self.clone();
        next.status = status;
        next.history.push(StatusChange {
            status,
            entered_at: now,
            actor: actor.to_string(),
        });
        Ok(next)
    }

    pub fn decided_by(&self) -> Option<&str> {
        if self.status.is_terminal() {
            self.history.last().map(|change| change.actor.as_str())
        } else {
            None
        }
    }
}

/// Approval queue order: URGENT before NORMAL, then oldest first
pub fn queue_order(a: &Requisition, b: &Requisition) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| a.requested_at.cmp(&b.requested_at))
}

impl WorkflowRecord for Requisition {
    const KIND: &'static str = "requisition";

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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn pending(priority: Priority, at: DateTime<Utc>) -> Requisition {
        Requisition::submit(
            BranchId::new("BR002"),
            "amina",
            vec![LineItem::new("2", "Amoxicillin 250mg", 50)],
            priority,
            at,
        )
        .unwrap()
    }

    #[test]
    fn test_submit_creates_pending() {
        let req = pending(Priority::Urgent, Utc::now());
        assert_eq!(req.status, RequisitionStatus::Pending);
        assert_eq!(req.history.len(), 1);
        assert_eq!(req.decided_by(), None);
    }

    #[test]
    fn test_submit_rejects_empty_items() {
        let result = Requisition::submit(
            BranchId::new("BR002"),
            "amina",
            vec![],
            Priority::Normal,
            Utc::now(),
        );
        assert_eq!(result.unwrap_err(), WorkflowError::EmptyItemSet);
    }

    #[test]
    fn test_decide_only_from_pending() {
        let req = pending(Priority::Normal, Utc::now());
        let approved = req.decide(Decision::Approved, "hq-admin", Utc::now()).unwrap();
        assert_eq!(approved.status, RequisitionStatus::Approved);
        assert_eq!(approved.decided_by(), Some("hq-admin"));
        // original is untouched
        assert_eq!(req.status, RequisitionStatus::Pending);

        for decision in [Decision::Approved, Decision::Rejected] {
            let err = approved.decide(decision, "hq-admin", Utc::now()).unwrap_err();
            assert!(matches!(
                err,
                WorkflowError::InvalidStateTransition { from: "APPROVED", .. }
            ));
        }
    }

    #[test]
    fn test_queue_order_urgent_first_then_oldest() {
        let t0 = Utc::now();
        let old_normal = pending(Priority::Normal, t0);
        let new_normal = pending(Priority::Normal, t0 + Duration::minutes(5));
        let new_urgent = pending(Priority::Urgent, t0 + Duration::minutes(10));

        let mut queue = vec![new_normal.clone(), old_normal.clone(), new_urgent.clone()];
        queue.sort_by(queue_order);
        let ids: Vec<_> = queue.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![new_urgent.id, old_normal.id, new_normal.id]);
    }
}
