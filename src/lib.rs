// Stockflow Library - multi-branch pharmacy stock workflows
// This exposes the core components for the CLI, testing and integration

pub mod collaborators;
pub mod config;
pub mod observability;
pub mod priority;
pub mod report;
pub mod scenario;
pub mod telemetry;
pub mod workflows;

// Re-export key types for easy access
pub use collaborators::{
    AccessPolicy, AllowAll, AuditEntry, AuditLog, BatchRef, InMemoryAuditLog,
    InMemoryStockLedger, LedgerKey, LedgerOutcome, LedgerTransition, RoleTable, Severity,
    StockLedger, StockLine,
};
pub use config::{config, StockflowConfig, WorkflowConfig};
pub use observability::{OperationTimer, WorkflowMetrics, WorkflowStats};
pub use priority::Priority;
pub use report::{export_csv, ReportKind};
pub use scenario::{Scenario, ScenarioRun, StepOutcome};
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry};
pub use workflows::{
    Actor, BranchId, Decision, DispatchReceipt, DisposalRequest, GateStatus, LineItem,
    ReleaseRequest, RequestId, Requisition, RequisitionStatus, Role, TransferRequest,
    TransferStatus, WorkflowError, WorkflowService,
};
