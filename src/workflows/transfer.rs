// Transfer workflow: DISPATCHED -> RECEIVED_KEEPER -> VERIFIED_CONTROLLER
//
// CANCELLED is reachable from either non-terminal state. The keeper code must
// be consumed before the controller step is reachable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::codes::VerificationCode;
use super::error::{Result, WorkflowError};
use super::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Dispatched,
    ReceivedKeeper,
    VerifiedController,
    Cancelled,
}

impl TransferStatus {
    pub fn label(self) -> &'static str {
        match self {
            TransferStatus::Dispatched => "DISPATCHED",
            TransferStatus::ReceivedKeeper => "RECEIVED_KEEPER",
            TransferStatus::VerifiedController => "VERIFIED_CONTROLLER",
            TransferStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransferStatus::VerifiedController | TransferStatus::Cancelled
        )
    }

    /// Number of confirmations completed at this status
    fn step(self) -> u8 {
        match self {
            TransferStatus::Dispatched | TransferStatus::Cancelled => 0,
            TransferStatus::ReceivedKeeper => 1,
            TransferStatus::VerifiedController => 2,
        }
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Party that performed a step in the handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferRole {
    Source,
    Keeper,
    Controller,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLogEntry {
    pub role: TransferRole,
    pub action: String,
    pub timestamp: DateTime<Utc>,
    pub user: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransferProgress {
    pub step: u8,
    pub logs: Vec<TransferLogEntry>,
}

/// A stock shipment between two locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub id: RequestId,
    pub source_branch_id: BranchId,
    pub target_branch_id: BranchId,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    pub items: Vec<LineItem>,
    pub status: TransferStatus,
    #[serde(skip)]
    keeper_code: Option<VerificationCode>,
    #[serde(skip)]
    controller_code: Option<VerificationCode>,
    pub received_by: Option<String>,
    pub workflow: TransferProgress,
    pub history: Vec<StatusChange<TransferStatus>>,
    pub version: u64,
}

/// Handed back to the dispatcher so the codes can be passed to each party
#[derive(Debug, Clone)]
pub struct DispatchReceipt {
    pub transfer_id: RequestId,
    pub keeper_code: VerificationCode,
    pub controller_code: VerificationCode,
}

impl TransferRequest {
    pub fn dispatch(
        source: BranchId,
        target: BranchId,
        dispatched_by: &str,
        items: Vec<LineItem>,
        codes: (VerificationCode, VerificationCode),
        now: DateTime<Utc>,
    ) -> Result<Self> {
        validate_items(&items)?;
        if source == target {
            return Err(WorkflowError::SameBranchTransfer {
                branch: source.to_string(),
            });
        }

        let (keeper_code, controller_code) = codes;
        let mut transfer = Self {
            id: RequestId::new(),
            source_branch_id: source,
            target_branch_id: target,
            requested_by: dispatched_by.to_string(),
            requested_at: now,
            items,
            status: TransferStatus::Dispatched,
            keeper_code: Some(keeper_code),
            controller_code: Some(controller_code),
            received_by: None,
            workflow: TransferProgress::default(),
            history: Vec::new(),
            version: 0,
        };
        transfer.enter(
            TransferStatus::Dispatched,
            TransferRole::Source,
            "Dispatched",
            dispatched_by,
            now,
        );
        Ok(transfer)
    }

    pub fn receipt(&self) -> Option<DispatchReceipt> {
        Some(DispatchReceipt {
            transfer_id: self.id,
            keeper_code: self.keeper_code.clone()?,
            controller_code: self.controller_code.clone()?,
        })
    }

    /// Whether the keeper code is still outstanding
    pub fn keeper_code_pending(&self) -> bool {
        self.keeper_code.is_some()
    }

    pub fn controller_code_pending(&self) -> bool {
        self.controller_code.is_some()
    }

    /// Keeper confirms physical custody. Consumes the keeper code.
    pub fn confirm_keeper_receipt(
        &self,
        entered: &str,
        keeper: &str,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let action = WorkflowAction::ConfirmKeeperReceipt;
        if self.status != TransferStatus::Dispatched {
            return Err(self.invalid(action));
        }
        let code = self.keeper_code.as_ref().ok_or_else(|| self.invalid(action))?;
        if !code.matches(entered) {
            return Err(WorkflowError::CodeMismatch {
                request_id: self.id,
                step: "keeper",
            });
        }

        let mut next = self.clone();
        next.keeper_code = None;
        next.received_by = Some(keeper.to_string());
        next.enter(
            TransferStatus::ReceivedKeeper,
            TransferRole::Keeper,
            "Received",
            keeper,
            now,
        );
        Ok(next)
    }

    /// Controller verifies the received stock. Consumes the controller code.
    /// Unless `allow_same_person` is set, the keeper who received cannot verify.
    pub fn confirm_controller_verification(
        &self,
        entered: &str,
        controller: &str,
        allow_same_person: bool,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let action = WorkflowAction::ConfirmControllerVerification;
        if self.status != TransferStatus::ReceivedKeeper || self.keeper_code.is_some() {
            return Err(self.invalid(action));
        }
        if !allow_same_person && self.received_by.as_deref() == Some(controller) {
            return Err(WorkflowError::SegregationOfDuties {
                user: controller.to_string(),
                request_id: self.id,
            });
        }
        let code = self
            .controller_code
            .as_ref()
            .ok_or_else(|| self.invalid(action))?;
        if !code.matches(entered) {
            return Err(WorkflowError::CodeMismatch {
                request_id: self.id,
                step: "controller",
            });
        }

        let mut next = self.clone();
        next.controller_code = None;
        next.enter(
            TransferStatus::VerifiedController,
            TransferRole::Controller,
            "Verified",
            controller,
            now,
        );
        Ok(next)
    }

    /// Cancel a transfer that has not been verified. Outstanding codes are voided.
    pub fn cancel(&self, actor: &str, role: TransferRole, reason: &str, now: DateTime<Utc>) -> Result<Self> {
        if self.status.is_terminal() {
            return Err(self.invalid(WorkflowAction::CancelTransfer));
        }

        let mut next = self.clone();
        next.keeper_code = None;
        next.controller_code = None;
        next.enter(TransferStatus::Cancelled, role, reason, actor, now);
        Ok(next)
    }

    fn enter(
        &mut self,
        status: TransferStatus,
        role: TransferRole,
        action: &str,
        user: &str,
        now: DateTime<Utc>,
    ) {
        self.status = status;
        self.workflow.step = status.step();
        self.workflow.logs.push(TransferLogEntry {
            role,
            action: action.to_string(),
            timestamp: now,
            user: user.to_string(),
        });
        self.history.push(StatusChange {
            status,
            entered_at: now,
            actor: user.to_string(),
        });
    }

    fn invalid(&self, action: WorkflowAction) -> WorkflowError {
        WorkflowError::InvalidStateTransition {
            request_id: self.id,
            from: self.status.label(),
            action,
        }
    }

    /// Time the record entered its current status
    pub fn status_since(&self) -> DateTime<Utc> {
        self.history
            .last()
            .map(|change| change.entered_at)
            .unwrap_or(self.requested_at)
    }
}

impl WorkflowRecord for TransferRequest {
    const KIND: &'static str = "transfer";

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
        &self.source_branch_id
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
