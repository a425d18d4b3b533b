use thiserror::Error;

use super::types::{RequestId, WorkflowAction};

/// Errors surfaced by workflow operations. None of them are retried internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Invalid transition: cannot {action} request {request_id} in state {from}")]
    InvalidStateTransition {
        request_id: RequestId,
        from: &'static str,
        action: WorkflowAction,
    },

    #[error("Verification code mismatch at {step} step for request {request_id}")]
    CodeMismatch {
        request_id: RequestId,
        step: &'static str,
    },

    #[error("Request has no line items")]
    EmptyItemSet,

    #[error("Invalid line item {line}: {reason}")]
    InvalidLineItem { line: usize, reason: String },

    #[error("Disposal line {line} has no reason")]
    MissingDisposalReason { line: usize },

    #[error("Transfer source and target are the same branch: {branch}")]
    SameBranchTransfer { branch: String },

    #[error("Request not found: {request_id}")]
    NotFound { request_id: RequestId },

    #[error("User {user} is not permitted to {action} at branch {branch}")]
    Unauthorized {
        user: String,
        action: WorkflowAction,
        branch: String,
    },

    #[error("User {user} already confirmed receipt and cannot also verify transfer {request_id}")]
    SegregationOfDuties { user: String, request_id: RequestId },
}

impl WorkflowError {
    /// Errors caused by the caller's input rather than the record's state
    pub fn is_client_error(&self) -> bool {
        !matches!(self, WorkflowError::InvalidStateTransition { .. })
    }

    /// Stable snake_case name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::InvalidStateTransition { .. } => "invalid_state_transition",
            WorkflowError::CodeMismatch { .. } => "code_mismatch",
            WorkflowError::EmptyItemSet => "empty_item_set",
            WorkflowError::InvalidLineItem { .. } => "invalid_line_item",
            WorkflowError::MissingDisposalReason { .. } => "missing_disposal_reason",
            WorkflowError::SameBranchTransfer { .. } => "same_branch_transfer",
            WorkflowError::NotFound { .. } => "not_found",
            WorkflowError::Unauthorized { .. } => "unauthorized",
            WorkflowError::SegregationOfDuties { .. } => "segregation_of_duties",
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
