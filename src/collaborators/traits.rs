// Traits for the external collaborators the workflow core talks to

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::workflows::types::{Actor, BranchId, ProductId, RequestId, WorkflowAction};

/// Which terminal transition produced a ledger instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerTransition {
    RequisitionApproved,
    TransferDebitSource,
    TransferCreditTarget,
    ReleaseAuthorized,
    DisposalAuthorized,
}

impl fmt::Display for LedgerTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LedgerTransition::RequisitionApproved => "requisition_approved",
            LedgerTransition::TransferDebitSource => "transfer_debit_source",
            LedgerTransition::TransferCreditTarget => "transfer_credit_target",
            LedgerTransition::ReleaseAuthorized => "release_authorized",
            LedgerTransition::DisposalAuthorized => "disposal_authorized",
        };
        f.write_str(label)
    }
}

/// Idempotency key: one per request, transition and line item
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LedgerKey {
    pub request_id: RequestId,
    pub transition: LedgerTransition,
    pub line: usize,
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.request_id, self.transition, self.line)
    }
}

/// A batch of one product held at one branch
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BatchRef {
    pub branch_id: BranchId,
    pub product_id: ProductId,
    pub batch_number: Option<String>,
}

impl fmt::Display for BatchRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.batch_number {
            Some(batch) => write!(f, "{}:{}:{}", self.branch_id, self.product_id, batch),
            None => write!(f, "{}:{}", self.branch_id, self.product_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLine {
    pub batch: BatchRef,
    pub quantity: u32,
}

/// Whether the ledger applied an instruction or had already seen its key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOutcome {
    Applied,
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Insufficient stock for {batch}: requested {requested}, available {available}")]
    InsufficientStock {
        batch: String,
        requested: u32,
        available: u32,
    },
    #[error("Batch {0} is condemned")]
    Condemned(String),
    #[error("Unknown batch: {0}")]
    UnknownBatch(String),
    #[error("Stock ledger unavailable: {0}")]
    Unavailable(String),
}

/// Stock ledger interface. Only called on terminal transitions.
/// Implementations must treat a repeated `LedgerKey` as a no-op.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Add stock to a batch
    async fn credit(&self, key: &LedgerKey, line: &StockLine) -> Result<LedgerOutcome, LedgerError>;

    /// Remove stock from a batch
    async fn debit(&self, key: &LedgerKey, line: &StockLine) -> Result<LedgerOutcome, LedgerError>;

    /// Lock a batch against sale
    async fn quarantine(&self, key: &LedgerKey, batch: &BatchRef) -> Result<LedgerOutcome, LedgerError>;

    /// Lift the quarantine flag so the batch is sellable
    async fn release_quarantine(
        &self,
        key: &LedgerKey,
        batch: &BatchRef,
    ) -> Result<LedgerOutcome, LedgerError>;

    /// Zero the batch and mark it condemned
    async fn condemn(&self, key: &LedgerKey, batch: &BatchRef) -> Result<LedgerOutcome, LedgerError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub actor: String,
    pub action: String,
    pub details: String,
    pub timestamp: DateTime<Utc>,
    pub branch_id: BranchId,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditError {
    #[error("Audit log unavailable: {0}")]
    Unavailable(String),
}

/// Audit log interface. Called on every transition and every rejected attempt.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError>;
}

/// Identity/role collaborator: decides whether an actor may perform an action
/// against a branch.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait AccessPolicy: Send + Sync {
    fn permits(&self, actor: &Actor, action: WorkflowAction, branch: &BranchId) -> bool;
}
