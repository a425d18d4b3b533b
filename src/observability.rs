use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{info, warn};

/// Workflow counters
#[derive(Debug, Default)]
pub struct WorkflowMetrics {
    pub requests_created: AtomicU64,
    pub transitions_committed: AtomicU64,
    pub transitions_rejected: AtomicU64,
    pub code_mismatches: AtomicU64,
    pub unauthorized_attempts: AtomicU64,
    pub ledger_failures: AtomicU64,
    pub ledger_redeliveries: AtomicU64,
    pub transfers_expired: AtomicU64,
}

impl WorkflowMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_created(&self) {
        self.requests_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_committed(&self) {
        self.transitions_committed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.transitions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_code_mismatch(&self) {
        self.code_mismatches.fetch_add(1, Ordering::Relaxed);
        warn!("Verification code mismatch");
    }

    pub fn record_unauthorized(&self) {
        self.unauthorized_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ledger_failure(&self) {
        self.ledger_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_redelivery(&self) {
        self.ledger_redeliveries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_expired(&self) {
        self.transfers_expired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> WorkflowStats {
        WorkflowStats {
            requests_created: self.requests_created.load(Ordering::Relaxed),
            transitions_committed: self.transitions_committed.load(Ordering::Relaxed),
            transitions_rejected: self.transitions_rejected.load(Ordering::Relaxed),
            code_mismatches: self.code_mismatches.load(Ordering::Relaxed),
            unauthorized_attempts: self.unauthorized_attempts.load(Ordering::Relaxed),
            ledger_failures: self.ledger_failures.load(Ordering::Relaxed),
            ledger_redeliveries: self.ledger_redeliveries.load(Ordering::Relaxed),
            transfers_expired: self.transfers_expired.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Workflow metrics: created={}, committed={}, rejected={}, code_mismatches={}, unauthorized={}, ledger_failures={}, redeliveries={}, expired={}",
            stats.requests_created,
            stats.transitions_committed,
            stats.transitions_rejected,
            stats.code_mismatches,
            stats.unauthorized_attempts,
            stats.ledger_failures,
            stats.ledger_redeliveries,
            stats.transfers_expired
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct WorkflowStats {
    pub requests_created: u64,
    pub transitions_committed: u64,
    pub transitions_rejected: u64,
    pub code_mismatches: u64,
    pub unauthorized_attempts: u64,
    pub ledger_failures: u64,
    pub ledger_redeliveries: u64,
    pub transfers_expired: u64,
}

/// Time an operation and log its duration
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn finish(self) {
        let duration = self.start.elapsed();
        info!(
            operation = %self.operation,
            duration_ms = duration.as_millis(),
            "Operation completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = WorkflowMetrics::new();
        metrics.record_created();
        metrics.record_committed();
        metrics.record_committed();
        metrics.record_code_mismatch();

        let stats = metrics.get_stats();
        assert_eq!(stats.requests_created, 1);
        assert_eq!(stats.transitions_committed, 2);
        assert_eq!(stats.code_mismatches, 1);
        assert_eq!(stats.ledger_failures, 0);
    }
}
