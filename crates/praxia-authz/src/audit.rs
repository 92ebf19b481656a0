//! Append-only decision audit sink

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// One audited evaluation, allow or deny
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    /// Entry id
    pub id: Uuid,
    /// Tenant the capability was evaluated for
    pub tenant_id: i64,
    /// Acting user
    pub user_id: i64,
    /// Capability as `application:action`
    pub capability: String,
    /// Outcome
    pub allowed: bool,
    /// Closed-vocabulary reason code
    pub reason: &'static str,
    /// Layer that produced the outcome
    pub layer: u8,
    /// Evaluation time
    pub at: DateTime<Utc>,
}

/// Append-only audit destination
pub trait AuditSink: Send + Sync {
    /// Append one entry; sinks never reorder or drop entries
    fn append(&self, entry: AuditEntry);
}

/// In-memory audit sink, queryable by tests
pub struct InMemoryAuditSink {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl InMemoryAuditSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Snapshot of all entries in append order
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().clone()
    }

    /// Number of entries appended
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether anything has been appended
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for InMemoryAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn append(&self, entry: AuditEntry) {
        self.entries.write().push(entry);
    }
}

/// Sink that emits each entry as a structured tracing event
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn append(&self, entry: AuditEntry) {
        tracing::info!(
            tenant_id = entry.tenant_id,
            user_id = entry.user_id,
            capability = %entry.capability,
            allowed = entry.allowed,
            reason = entry.reason,
            layer = entry.layer,
            "access decision"
        );
    }
}
