//! License and entitlement stores

use crate::model::{Entitlement, License, LicenseStatus};
use parking_lot::RwLock;
use praxia_common::{AccessError, AccessResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Read access to tenant-application licenses
pub trait LicenseStore: Send + Sync {
    /// License for a tenant within an application
    fn license(&self, tenant_id: i64, application: &str) -> AccessResult<Option<License>>;
}

/// Read access to user entitlements
pub trait EntitlementStore: Send + Sync {
    /// Entitlement for a user within a tenant's application
    fn entitlement(
        &self,
        tenant_id: i64,
        user_id: i64,
        application: &str,
    ) -> AccessResult<Option<Entitlement>>;
}

/// In-memory license store
///
/// Lookups are counted so tests can assert layer short-circuiting.
/// Seat increments go through [`try_consume_seat`], the transactional
/// check-and-increment used by the grant collaborator.
///
/// [`try_consume_seat`]: InMemoryLicenseStore::try_consume_seat
pub struct InMemoryLicenseStore {
    rows: Arc<RwLock<HashMap<(i64, String), License>>>,
    lookups: AtomicU64,
}

impl InMemoryLicenseStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
            lookups: AtomicU64::new(0),
        }
    }

    /// Insert or replace a license row
    pub fn insert(&self, license: License) {
        self.rows
            .write()
            .insert((license.tenant_id, license.application.clone()), license);
    }

    /// Update a license status
    pub fn set_status(&self, tenant_id: i64, application: &str, status: LicenseStatus) {
        if let Some(row) = self
            .rows
            .write()
            .get_mut(&(tenant_id, application.to_string()))
        {
            row.status = status;
        }
    }

    /// Check-and-increment one seat under the write lock
    pub fn try_consume_seat(&self, tenant_id: i64, application: &str) -> AccessResult<()> {
        let mut rows = self.rows.write();
        let row = rows
            .get_mut(&(tenant_id, application.to_string()))
            .ok_or(AccessError::LicenseMissing)?;
        if row.seats_used >= row.seats_purchased {
            return Err(AccessError::SeatLimitReached);
        }
        row.seats_used += 1;
        Ok(())
    }

    /// Number of lookups served so far
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryLicenseStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LicenseStore for InMemoryLicenseStore {
    fn license(&self, tenant_id: i64, application: &str) -> AccessResult<Option<License>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .rows
            .read()
            .get(&(tenant_id, application.to_string()))
            .cloned())
    }
}

/// In-memory entitlement store with counted lookups
pub struct InMemoryEntitlementStore {
    rows: Arc<RwLock<HashMap<(i64, i64, String), Entitlement>>>,
    lookups: AtomicU64,
}

impl InMemoryEntitlementStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
            lookups: AtomicU64::new(0),
        }
    }

    /// Insert or replace an entitlement row
    pub fn insert(&self, entitlement: Entitlement) {
        self.rows.write().insert(
            (
                entitlement.tenant_id,
                entitlement.user_id,
                entitlement.application.clone(),
            ),
            entitlement,
        );
    }

    /// Number of lookups served so far
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryEntitlementStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntitlementStore for InMemoryEntitlementStore {
    fn entitlement(
        &self,
        tenant_id: i64,
        user_id: i64,
        application: &str,
    ) -> AccessResult<Option<Entitlement>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .rows
            .read()
            .get(&(tenant_id, user_id, application.to_string()))
            .cloned())
    }
}
