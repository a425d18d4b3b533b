// Core types shared by every stock workflow

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::error::WorkflowError;

/// Unique identifier of a workflow request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A physical pharmacy location (or central supply)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(pub String);

impl BranchId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BranchId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// One product line on a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    #[serde(default)]
    pub batch_number: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl LineItem {
    pub fn new(product_id: impl Into<String>, product_name: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: ProductId(product_id.into()),
            product_name: product_name.into(),
            quantity,
            batch_number: None,
            expiry_date: None,
            reason: None,
        }
    }

    pub fn with_batch(mut self, batch: impl Into<String>) -> Self {
        self.batch_number = Some(batch.into());
        self
    }

    pub fn with_expiry(mut self, expiry: NaiveDate) -> Self {
        self.expiry_date = Some(expiry);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Reason text if present and not blank
    pub fn reason_text(&self) -> Option<&str> {
        self.reason
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }
}

/// Reject empty item sets and zero-quantity lines
pub fn validate_items(items: &[LineItem]) -> Result<(), WorkflowError> {
    if items.is_empty() {
        return Err(WorkflowError::EmptyItemSet);
    }
    for (line, item) in items.iter().enumerate() {
        if item.quantity == 0 {
            return Err(WorkflowError::InvalidLineItem {
                line,
                reason: format!("product {} has zero quantity", item.product_id),
            });
        }
        if item.product_id.0.trim().is_empty() {
            return Err(WorkflowError::InvalidLineItem {
                line,
                reason: "product id is blank".to_string(),
            });
        }
    }
    Ok(())
}

/// Roles supplied by the identity collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    BranchStaff,
    BranchManager,
    CentralAdmin,
    Keeper,
    Controller,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::BranchStaff => "branch_staff",
            Role::BranchManager => "branch_manager",
            Role::CentralAdmin => "central_admin",
            Role::Keeper => "keeper",
            Role::Controller => "controller",
        };
        f.write_str(label)
    }
}

/// Which branches an actor may act on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchScope {
    All,
    Branches(Vec<BranchId>),
}

impl BranchScope {
    pub fn covers(&self, branch: &BranchId) -> bool {
        match self {
            BranchScope::All => true,
            BranchScope::Branches(branches) => branches.contains(branch),
        }
    }
}

/// The caller of a workflow operation, as resolved by the identity collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user: String,
    pub role: Role,
    pub scope: BranchScope,
}

impl Actor {
    pub fn new(user: impl Into<String>, role: Role, scope: BranchScope) -> Self {
        Self {
            user: user.into(),
            role,
            scope,
        }
    }

    /// Actor scoped to a single branch
    pub fn at_branch(user: impl Into<String>, role: Role, branch: impl Into<String>) -> Self {
        Self::new(user, role, BranchScope::Branches(vec![BranchId::new(branch)]))
    }

    /// Actor with chain-wide scope
    pub fn central(user: impl Into<String>, role: Role) -> Self {
        Self::new(user, role, BranchScope::All)
    }

    /// Synthetic actor for automatic transitions such as expiry
    pub fn system() -> Self {
        Self::new("system", Role::CentralAdmin, BranchScope::All)
    }
}

/// Every operation that goes through the access policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    SubmitRequisition,
    DecideRequisition,
    DispatchTransfer,
    ConfirmKeeperReceipt,
    ConfirmControllerVerification,
    CancelTransfer,
    RequestRelease,
    AuthorizeRelease,
    RequestDisposal,
    AuthorizeDisposal,
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            WorkflowAction::SubmitRequisition => "submit_requisition",
            WorkflowAction::DecideRequisition => "decide_requisition",
            WorkflowAction::DispatchTransfer => "dispatch_transfer",
            WorkflowAction::ConfirmKeeperReceipt => "confirm_keeper_receipt",
            WorkflowAction::ConfirmControllerVerification => "confirm_controller_verification",
            WorkflowAction::CancelTransfer => "cancel_transfer",
            WorkflowAction::RequestRelease => "request_release",
            WorkflowAction::AuthorizeRelease => "authorize_release",
            WorkflowAction::RequestDisposal => "request_disposal",
            WorkflowAction::AuthorizeDisposal => "authorize_disposal",
        };
        f.write_str(label)
    }
}

/// A status a record has entered, with who moved it there
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange<S> {
    pub status: S,
    pub entered_at: DateTime<Utc>,
    pub actor: String,
}

/// Common surface of every stored workflow record
pub trait WorkflowRecord: Clone + Send + Sync + 'static {
    /// Short name of the workflow kind, used in logs and errors
    const KIND: &'static str;

    fn id(&self) -> RequestId;
    fn version(&self) -> u64;
    fn bump_version(&mut self);
    fn branch_id(&self) -> &BranchId;
    fn status_label(&self) -> &'static str;
    fn is_terminal(&self) -> bool;
    fn items(&self) -> &[LineItem];
    fn requested_at(&self) -> DateTime<Utc>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_items_rejects_empty() {
        assert!(matches!(validate_items(&[]), Err(WorkflowError::EmptyItemSet)));
    }

    #[test]
    fn test_validate_items_rejects_zero_quantity() {
        let items = vec![
            LineItem::new("1", "Paracetamol 500mg", 10),
            LineItem::new("2", "Amoxicillin 250mg", 0),
        ];
        match validate_items(&items) {
            Err(WorkflowError::InvalidLineItem { line, .. }) => assert_eq!(line, 1),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_reason_text_ignores_blank() {
        let item = LineItem::new("1", "Paracetamol", 1).with_reason("   ");
        assert_eq!(item.reason_text(), None);
        let item = LineItem::new("1", "Paracetamol", 1).with_reason(" expired ");
        assert_eq!(item.reason_text(), Some("expired"));
    }

    #[test]
    fn test_branch_scope() {
        let scope = BranchScope::Branches(vec![BranchId::new("BR001")]);
        assert!(scope.covers(&BranchId::new("BR001")));
        assert!(!scope.covers(&BranchId::new("BR002")));
        assert!(BranchScope::All.covers(&BranchId::new("BR002")));
    }
}
