// In-memory stock ledger with per-key deduplication

use async_trait::async_trait;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use tracing::{debug, info, warn};

use super::traits::*;

/// Current state of one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StockEntry {
    pub quantity: u32,
    pub quarantined: bool,
    pub condemned: bool,
}

/// One instruction that actually changed stock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedInstruction {
    pub key: LedgerKey,
    pub operation: &'static str,
    pub batch: BatchRef,
    pub quantity: u32,
}

#[derive(Debug, Default)]
struct LedgerState {
    stock: BTreeMap<BatchRef, StockEntry>,
    seen: HashSet<LedgerKey>,
    applied: Vec<AppliedInstruction>,
}

#[derive(Debug, Default)]
pub struct InMemoryStockLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryStockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed opening stock for a batch
    pub fn seed(&self, batch: BatchRef, quantity: u32, quarantined: bool) {
        let mut state = self.lock();
        let entry = state.stock.entry(batch).or_default();
        entry.quantity = quantity;
        entry.quarantined = quarantined;
    }

    pub fn entry(&self, batch: &BatchRef) -> Option<StockEntry> {
        self.lock().stock.get(batch).cloned()
    }

    pub fn quantity(&self, batch: &BatchRef) -> u32 {
        self.entry(batch).map(|e| e.quantity).unwrap_or(0)
    }

    pub fn snapshot(&self) -> Vec<(BatchRef, StockEntry)> {
        self.lock()
            .stock
            .iter()
            .map(|(batch, entry)| (batch.clone(), entry.clone()))
            .collect()
    }

    /// Instructions that changed stock, in application order
    pub fn applied(&self) -> Vec<AppliedInstruction> {
        self.lock().applied.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        // poisoned state is still consistent: entries are replaced whole
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `apply` once per key. A key seen before is reported as a duplicate.
    fn once<F>(
        &self,
        key: &LedgerKey,
        operation: &'static str,
        batch: &BatchRef,
        quantity: u32,
        apply: F,
    ) -> Result<LedgerOutcome, LedgerError>
    where
        F: FnOnce(&mut StockEntry) -> Result<(), LedgerError>,
    {
        let mut state = self.lock();
        if state.seen.contains(key) {
            debug!(key = %key, operation, "Duplicate ledger instruction ignored");
            return Ok(LedgerOutcome::Duplicate);
        }

        let mut entry = state.stock.get(batch).cloned().unwrap_or_default();
        apply(&mut entry)?;
        state.stock.insert(batch.clone(), entry);
        state.seen.insert(key.clone());
        state.applied.push(AppliedInstruction {
            key: key.clone(),
            operation,
            batch: batch.clone(),
            quantity,
        });
        info!(key = %key, operation, batch = %batch, quantity, "Ledger instruction applied");
        Ok(LedgerOutcome::Applied)
    }
}

#[async_trait]
impl StockLedger for InMemoryStockLedger {
    async fn credit(&self, key: &LedgerKey, line: &StockLine) -> Result<LedgerOutcome, LedgerError> {
        self.once(key, "credit", &line.batch, line.quantity, |entry| {
            if entry.condemned {
                return Err(LedgerError::Condemned(line.batch.to_string()));
            }
            entry.quantity = entry.quantity.saturating_add(line.quantity);
            Ok(())
        })
    }

    async fn debit(&self, key: &LedgerKey, line: &StockLine) -> Result<LedgerOutcome, LedgerError> {
        self.once(key, "debit", &line.batch, line.quantity, |entry| {
            if entry.quantity < line.quantity {
                warn!(batch = %line.batch, requested = line.quantity, available = entry.quantity, "Debit exceeds stock");
                return Err(LedgerError::InsufficientStock {
                    batch: line.batch.to_string(),
                    requested: line.quantity,
                    available: entry.quantity,
                });
            }
            entry.quantity -= line.quantity;
            Ok(())
        })
    }

    async fn quarantine(&self, key: &LedgerKey, batch: &BatchRef) -> Result<LedgerOutcome, LedgerError> {
        self.once(key, "quarantine", batch, 0, |entry| {
            entry.quarantined = true;
            Ok(())
        })
    }

    async fn release_quarantine(
        &self,
        key: &LedgerKey,
        batch: &BatchRef,
    ) -> Result<LedgerOutcome, LedgerError> {
        self.once(key, "release_quarantine", batch, 0, |entry| {
            if entry.condemned {
                return Err(LedgerError::Condemned(batch.to_string()));
            }
            entry.quarantined = false;
            Ok(())
        })
    }

    async fn condemn(&self, key: &LedgerKey, batch: &BatchRef) -> Result<LedgerOutcome, LedgerError> {
        self.once(key, "condemn", batch, 0, |entry| {
            entry.quantity = 0;
            entry.condemned = true;
            Ok(())
        })
    }
}
