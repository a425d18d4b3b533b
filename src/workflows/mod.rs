// Stock workflows - requisitions, transfers, releases and disposals
//
// Records are immutable values; each transition produces the next record and
// the store commits it atomically.

pub mod codes;
pub mod disposal;
pub mod error;
pub mod gate;
pub mod release;
pub mod requisition;
pub mod service;
pub mod store;
pub mod transfer;
pub mod types;

pub use codes::{CodeGenerator, FixedCodes, RandomCodes, VerificationCode};
pub use disposal::DisposalRequest;
pub use error::{Result, WorkflowError};
pub use gate::GateStatus;
pub use release::ReleaseRequest;
pub use requisition::{Decision, Requisition, RequisitionStatus};
pub use service::{LedgerInstruction, LedgerNotification, RedeliveryReport, WorkflowService};
pub use store::{RecordStore, Transitioned};
pub use transfer::{DispatchReceipt, TransferRequest, TransferRole, TransferStatus};
pub use types::{
    Actor, BranchId, BranchScope, LineItem, ProductId, RequestId, Role, WorkflowAction,
    WorkflowRecord,
};
