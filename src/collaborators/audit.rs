use async_trait::async_trait;
use std::sync::Mutex;

use super::traits::{AuditEntry, AuditError, AuditLog, Severity};

/// Append-only audit log kept in memory
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn entries_for_action(&self, action: &str) -> Vec<AuditEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.action == action)
            .collect()
    }

    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.entries()
            .iter()
            .filter(|e| e.severity >= severity)
            .count()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        tracing::debug!(
            actor = %entry.actor,
            action = %entry.action,
            branch = %entry.branch_id,
            severity = %entry.severity,
            "Audit entry recorded"
        );
        self.entries
            .lock()
            .map_err(|e| AuditError::Unavailable(e.to_string()))?
            .push(entry);
        Ok(())
    }
}
