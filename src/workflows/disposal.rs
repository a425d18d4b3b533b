// Disposal workflow: permanently condemn stock. Authorization is irreversible.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::{Result, WorkflowError};
use super::gate::{self, GateStatus};
use super::types::*;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisposalRequest {
    pub id: RequestId,
    pub branch_id: BranchId,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub items: Vec<LineItem>,
    pub reason: Option<String>,
    pub status: GateStatus,
    pub history: Vec<StatusChange<GateStatus>>,
    pub version: u64,
}

impl DisposalRequest {
    /// Every item needs a reason. The request-level reason fills items that have none.
    pub fn request(
        branch_id: BranchId,
        requested_by: &str,
        mut items: Vec<LineItem>,
        reason: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        validate_items(&items)?;

        let reason = reason.map(str::trim).filter(|r| !r.is_empty());
        for (line, item) in items.iter_mut().enumerate() {
            if item.reason_text().is_some() {
                continue;
            }
            match reason {
                Some(reason) => item.reason = Some(reason.to_string()),
                None => return Err(WorkflowError::MissingDisposalReason { line }),
            }
        }

        Ok(Self {
            id: RequestId::new(),
            branch_id,
            requested_by: requested_by.to_string(),
            requested_at: now,
            items,
            reason: reason.map(str::to_string),
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
            WorkflowAction::AuthorizeDisposal,
            actor,
            now,
        )?;
        Ok(next)
    }
}

impl WorkflowRecord for DisposalRequest {
    const KIND: &'static str = "disposal";

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

    fn expired_line() -> LineItem {
        LineItem::new("3", "Cough Syrup 100ml", 24).with_batch("CS-19")
    }

    #[test]
    fn test_request_level_reason_fills_items() {
        let disposal = DisposalRequest::request(
            BranchId::new("BR003"),
            "clerk",
            vec![expired_line(), expired_line().with_reason("Damaged")],
            Some("Expired"),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(disposal.items[0].reason.as_deref(), Some("Expired"));
        assert_eq!(disposal.items[1].reason.as_deref(), Some("Damaged"));
    }

    #[test]
    fn test_missing_reason_rejected() {
        let err = DisposalRequest::request(
            BranchId::new("BR003"),
            "clerk",
            vec![expired_line().with_reason("Expired"), expired_line()],
            Some("  "),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err, WorkflowError::MissingDisposalReason { line: 1 });
    }

    #[test]
    fn test_empty_items_rejected_before_reason_check() {
        let err = DisposalRequest::request(BranchId::new("BR003"), "clerk", vec![], None, Utc::now())
            .unwrap_err();
        assert_eq!(err, WorkflowError::EmptyItemSet);
    }

    #[test]
    fn test_authorized_disposal_is_final() {
        let disposal = DisposalRequest::request(
            BranchId::new("BR003"),
            "clerk",
            vec![expired_line()],
            Some("Expired"),
            Utc::now(),
        )
        .unwrap();
        let authorized = disposal.authorize("hq-admin", Utc::now()).unwrap();
        assert_eq!(authorized.status, GateStatus::Authorized);
        assert!(authorized.authorize("hq-admin", Utc::now()).is_err());
    }
}
