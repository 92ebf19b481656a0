//! Tenant data model

use serde::{Deserialize, Serialize};

/// Lifecycle status of a tenant account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    /// Account in good standing
    Active,
    /// Account cancelled; all requests are refused
    Cancelled,
}

/// Registry row for one tenant
///
/// Backed by the tenant registry table `(id, slug, active, status,
/// timezone)`. The `active` flag and `status` column both exist in the
/// registry; a tenant is usable only when both agree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantRecord {
    /// Canonical numeric id
    pub id: i64,
    /// Human-readable slug, unique across tenants
    pub slug: String,
    /// Operational kill-switch
    pub active: bool,
    /// Lifecycle status
    pub status: TenantStatus,
    /// IANA timezone name
    pub timezone: String,
}

impl TenantRecord {
    /// Whether requests for this tenant may proceed
    pub fn is_usable(&self) -> bool {
        self.active && self.status == TenantStatus::Active
    }
}

/// Canonical per-request tenant context
///
/// Created once by the resolver, immutable for the request's lifetime,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TenantContext {
    /// Canonical numeric id; the only identity used downstream
    pub id: i64,
    /// Slug, for logging and display only
    pub slug: String,
    /// Allow-list-validated namespace name
    pub schema_name: String,
    /// IANA timezone name
    pub timezone: String,
    /// Lifecycle status at resolution time
    pub status: TenantStatus,
}
