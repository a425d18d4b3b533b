// Collaborators - stock ledger, audit log and access policy
//
// The workflow core only sees the traits; in-memory implementations back the
// CLI scenarios and the tests.

pub mod access;
pub mod audit;
pub mod ledger;
pub mod traits;

#[cfg(test)]
pub mod mocks;

pub use access::{AllowAll, RoleTable};
pub use audit::InMemoryAuditLog;
pub use ledger::{InMemoryStockLedger, StockEntry};
pub use traits::{
    AccessPolicy, AuditEntry, AuditError, AuditLog, BatchRef, LedgerError, LedgerKey,
    LedgerOutcome, LedgerTransition, Severity, StockLedger, StockLine,
};
