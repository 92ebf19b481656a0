//! Append-only usage ledger.
//!
//! Provider callbacks may be redelivered, so the ledger enforces
//! uniqueness on `(tenant_id, provider_request_id)`: a duplicate append
//! is reported and never double-counts usage or cost.

use chrono::{DateTime, Datelike, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// One completed metered operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Owning tenant
    pub tenant_id: i64,
    /// Internal operation id
    pub operation_id: Uuid,
    /// Transcribed audio length
    pub audio_duration_seconds: u64,
    /// Cost in USD; locally estimated, later reconciled
    pub cost_usd: f64,
    /// When the usage occurred
    pub usage_date: DateTime<Utc>,
    /// The provider's own request id; idempotency key
    pub provider_request_id: String,
}

/// Outcome of an append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// First delivery; the record was stored
    Recorded,
    /// Redelivery; nothing changed
    Duplicate,
}

/// Append-only store of usage records
pub struct UsageLedger {
    records: Arc<RwLock<Vec<UsageRecord>>>,
    seen: Arc<RwLock<HashSet<(i64, String)>>>,
}

impl UsageLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
            seen: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// Append a record unless its provider request id was already seen
    pub fn append(&self, record: UsageRecord) -> RecordOutcome {
        let key = (record.tenant_id, record.provider_request_id.clone());
        // The uniqueness check and the insert share one write lock so
        // concurrent redeliveries cannot both pass.
        let mut seen = self.seen.write();
        if !seen.insert(key) {
            return RecordOutcome::Duplicate;
        }
        self.records.write().push(record);
        RecordOutcome::Recorded
    }

    /// Seconds consumed by a tenant in the UTC calendar month of `now`
    pub fn month_usage_seconds(&self, tenant_id: i64, now: DateTime<Utc>) -> u64 {
        self.records
            .read()
            .iter()
            .filter(|r| {
                r.tenant_id == tenant_id
                    && r.usage_date.year() == now.year()
                    && r.usage_date.month() == now.month()
            })
            .map(|r| r.audio_duration_seconds)
            .sum()
    }

    /// Overwrite the stored cost for one record
    ///
    /// Used by reconciliation; returns false when no such record exists.
    pub fn set_cost(&self, tenant_id: i64, provider_request_id: &str, cost_usd: f64) -> bool {
        let mut records = self.records.write();
        match records
            .iter_mut()
            .find(|r| r.tenant_id == tenant_id && r.provider_request_id == provider_request_id)
        {
            Some(record) => {
                record.cost_usd = cost_usd;
                true
            }
            None => false,
        }
    }

    /// Stored cost for one record
    pub fn cost_of(&self, tenant_id: i64, provider_request_id: &str) -> Option<f64> {
        self.records
            .read()
            .iter()
            .find(|r| r.tenant_id == tenant_id && r.provider_request_id == provider_request_id)
            .map(|r| r.cost_usd)
    }

    /// All records for a tenant, in append order
    pub fn records_for(&self, tenant_id: i64) -> Vec<UsageRecord> {
        self.records
            .read()
            .iter()
            .filter(|r| r.tenant_id == tenant_id)
            .cloned()
            .collect()
    }
}

impl Default for UsageLedger {
    fn default() -> Self {
        Self::new()
    }
}
