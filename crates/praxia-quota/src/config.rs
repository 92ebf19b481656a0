//! Per-tenant quota configuration

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// One tenant's plan binding and overrides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantQuotaConfig {
    /// Owning tenant
    pub tenant_id: i64,
    /// Bound plan slug
    pub plan_slug: String,
    /// Custom monthly limit; honored only when the plan allows it
    pub custom_monthly_limit: Option<u64>,
    /// Whether this tenant may run past its limit
    pub overage_allowed: bool,
    /// When the current plan took effect; resets on every plan change
    pub plan_activated_at: DateTime<Utc>,
}

/// Store of per-tenant quota configuration rows
pub struct QuotaConfigStore {
    rows: Arc<RwLock<HashMap<i64, TenantQuotaConfig>>>,
}

impl QuotaConfigStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert or replace a tenant's configuration
    pub fn insert(&self, config: TenantQuotaConfig) {
        self.rows.write().insert(config.tenant_id, config);
    }

    /// Configuration for a tenant
    pub fn get(&self, tenant_id: i64) -> Option<TenantQuotaConfig> {
        self.rows.read().get(&tenant_id).cloned()
    }

    /// Bind a tenant to a plan
    ///
    /// `plan_activated_at` resets only when the plan actually changes,
    /// so re-binding the same plan does not restart a trial clock.
    pub fn set_plan(&self, tenant_id: i64, plan_slug: &str, now: DateTime<Utc>) {
        let mut rows = self.rows.write();
        match rows.get_mut(&tenant_id) {
            Some(config) => {
                if config.plan_slug != plan_slug {
                    config.plan_slug = plan_slug.to_string();
                    config.plan_activated_at = now;
                }
            }
            None => {
                rows.insert(
                    tenant_id,
                    TenantQuotaConfig {
                        tenant_id,
                        plan_slug: plan_slug.to_string(),
                        custom_monthly_limit: None,
                        overage_allowed: false,
                        plan_activated_at: now,
                    },
                );
            }
        }
    }
}

impl Default for QuotaConfigStore {
    fn default() -> Self {
        Self::new()
    }
}
