// Mock collaborators for testing - record every call, optionally fail

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::ledger::InMemoryStockLedger;
use super::traits::*;

/// A ledger call as the workflow core issued it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerCall {
    Credit { key: LedgerKey, line: StockLine },
    Debit { key: LedgerKey, line: StockLine },
    Quarantine { key: LedgerKey, batch: BatchRef },
    ReleaseQuarantine { key: LedgerKey, batch: BatchRef },
    Condemn { key: LedgerKey, batch: BatchRef },
}

/// Wraps the in-memory ledger, records calls and can be told to fail
#[derive(Debug, Default)]
pub struct RecordingLedger {
    pub inner: InMemoryStockLedger,
    calls: Mutex<Vec<LedgerCall>>,
    failures_remaining: AtomicUsize,
}

impl RecordingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// The next `count` calls fail with `Unavailable`
    pub fn fail_next(&self, count: usize) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<LedgerCall> {
        self.log().clone()
    }

    pub fn credits(&self) -> Vec<StockLine> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                LedgerCall::Credit { line, .. } => Some(line),
                _ => None,
            })
            .collect()
    }

    pub fn debits(&self) -> Vec<StockLine> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                LedgerCall::Debit { line, .. } => Some(line),
                _ => None,
            })
            .collect()
    }

    pub fn condemned(&self) -> Vec<BatchRef> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                LedgerCall::Condemn { batch, .. } => Some(batch),
                _ => None,
            })
            .collect()
    }

    pub fn released(&self) -> Vec<BatchRef> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                LedgerCall::ReleaseQuarantine { batch, .. } => Some(batch),
                _ => None,
            })
            .collect()
    }

    fn log(&self) -> std::sync::MutexGuard<'_, Vec<LedgerCall>> {
        self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: LedgerCall) -> Result<(), LedgerError> {
        self.log().push(call);
        let failing = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(LedgerError::Unavailable("injected failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl StockLedger for RecordingLedger {
    async fn credit(&self, key: &LedgerKey, line: &StockLine) -> Result<LedgerOutcome, LedgerError> {
        self.record(LedgerCall::Credit {
            key: key.clone(),
            line: line.clone(),
        })?;
        self.inner.credit(key, line).await
    }

    async fn debit(&self, key: &LedgerKey, line: &StockLine) -> Result<LedgerOutcome, LedgerError> {
        self.record(LedgerCall::Debit {
            key: key.clone(),
            line: line.clone(),
        })?;
        self.inner.debit(key, line).await
    }

    async fn quarantine(&self, key: &LedgerKey, batch: &BatchRef) -> Result<LedgerOutcome, LedgerError> {
        self.record(LedgerCall::Quarantine {
            key: key.clone(),
            batch: batch.clone(),
        })?;
        self.inner.quarantine(key, batch).await
    }

    async fn release_quarantine(
        &self,
        key: &LedgerKey,
        batch: &BatchRef,
    ) -> Result<LedgerOutcome, LedgerError> {
        self.record(LedgerCall::ReleaseQuarantine {
            key: key.clone(),
            batch: batch.clone(),
        })?;
        self.inner.release_quarantine(key, batch).await
    }

    async fn condemn(&self, key: &LedgerKey, batch: &BatchRef) -> Result<LedgerOutcome, LedgerError> {
        self.record(LedgerCall::Condemn {
            key: key.clone(),
            batch: batch.clone(),
        })?;
        self.inner.condemn(key, batch).await
    }
}

/// Audit log that is always down
#[derive(Debug, Default)]
pub struct UnavailableAuditLog;

#[async_trait]
impl AuditLog for UnavailableAuditLog {
    async fn record(&self, _entry: AuditEntry) -> Result<(), AuditError> {
        Err(AuditError::Unavailable("audit sink offline".to_string()))
    }
}
