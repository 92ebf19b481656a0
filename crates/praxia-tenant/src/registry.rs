//! Tenant registry store

use crate::model::TenantRecord;
use parking_lot::RwLock;
use praxia_common::AccessResult;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Read access to the tenant registry table
pub trait TenantDirectory: Send + Sync {
    /// Lookup by canonical numeric id
    fn by_id(&self, id: i64) -> AccessResult<Option<TenantRecord>>;
    /// Lookup by slug
    fn by_slug(&self, slug: &str) -> AccessResult<Option<TenantRecord>>;
}

/// In-memory tenant registry
///
/// Keeps an id-keyed primary map and a slug index. Lookups are counted
/// so tests can assert that failed pipelines make zero store calls.
pub struct InMemoryTenantRegistry {
    tenants: Arc<RwLock<HashMap<i64, TenantRecord>>>,
    slug_index: Arc<RwLock<HashMap<String, i64>>>,
    lookups: AtomicU64,
}

impl InMemoryTenantRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            tenants: Arc::new(RwLock::new(HashMap::new())),
            slug_index: Arc::new(RwLock::new(HashMap::new())),
            lookups: AtomicU64::new(0),
        }
    }

    /// Insert or replace a tenant row
    pub fn insert(&self, record: TenantRecord) {
        self.slug_index
            .write()
            .insert(record.slug.clone(), record.id);
        self.tenants.write().insert(record.id, record);
    }

    /// Number of lookups served so far
    pub fn lookup_count(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryTenantRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TenantDirectory for InMemoryTenantRegistry {
    fn by_id(&self, id: i64) -> AccessResult<Option<TenantRecord>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        Ok(self.tenants.read().get(&id).cloned())
    }

    fn by_slug(&self, slug: &str) -> AccessResult<Option<TenantRecord>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let id = match self.slug_index.read().get(slug) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.tenants.read().get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TenantStatus;

    fn acme() -> TenantRecord {
        TenantRecord {
            id: 10,
            slug: "acme".into(),
            active: true,
            status: TenantStatus::Active,
            timezone: "UTC".into(),
        }
    }

    #[test]
    fn test_slug_resolves_to_same_row_as_id() {
        let registry = InMemoryTenantRegistry::new();
        registry.insert(acme());

        let by_id = registry.by_id(10).unwrap().unwrap();
        let by_slug = registry.by_slug("acme").unwrap().unwrap();
        assert_eq!(by_id.id, by_slug.id);
        assert_eq!(registry.lookup_count(), 2);
    }

    #[test]
    fn test_missing_tenant_is_none_not_error() {
        let registry = InMemoryTenantRegistry::new();
        assert!(registry.by_id(99).unwrap().is_none());
        assert!(registry.by_slug("ghost").unwrap().is_none());
    }
}
