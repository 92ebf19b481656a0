//! Quota tracking and cost accounting

use crate::config::{QuotaConfigStore, TenantQuotaConfig};
use crate::ledger::{RecordOutcome, UsageLedger, UsageRecord};
use crate::plan::{PlanCatalog, TranscriptionPlan};
use chrono::{DateTime, Datelike, Duration, Utc};
use praxia_authz::TrialExpirySource;
use praxia_common::cache::AggregateCache;
use praxia_common::{AccessError, AccessResult};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Cost deltas below this are left alone during reconciliation
const COST_TOLERANCE_USD: f64 = 0.0001;

/// Result of a pre-flight quota check
#[derive(Debug, Clone, Serialize)]
pub struct QuotaStatus {
    /// Minutes consumed this calendar month (ceiling-rounded)
    pub used_minutes: u64,
    /// Effective monthly limit
    pub limit_minutes: u64,
    /// Minutes left; zero when at or past the limit
    pub remaining_minutes: u64,
    /// Whether overage is permitted
    pub overage_allowed: bool,
    /// Whether consumption is already past the limit
    pub in_overage: bool,
    /// Consumed share of the limit, as a percentage
    pub utilization: f64,
}

impl QuotaStatus {
    fn new(used_minutes: u64, limit_minutes: u64, overage_allowed: bool) -> Self {
        let utilization = if limit_minutes == 0 {
            100.0
        } else {
            (used_minutes as f64 / limit_minutes as f64) * 100.0
        };
        Self {
            used_minutes,
            limit_minutes,
            remaining_minutes: limit_minutes.saturating_sub(used_minutes),
            overage_allowed,
            in_overage: used_minutes >= limit_minutes,
            utilization,
        }
    }
}

/// A completed metered operation as reported by the provider callback
#[derive(Debug, Clone)]
pub struct UsageEvent {
    /// Internal operation id
    pub operation_id: Uuid,
    /// Provider's own request id; idempotency key
    pub provider_request_id: String,
    /// Transcribed audio length
    pub audio_duration_seconds: u64,
    /// Transcription model used
    pub model: String,
    /// When the usage occurred
    pub usage_date: DateTime<Utc>,
}

/// Authoritative cost source, backed by the provider's billing API
pub trait BillingProvider: Send + Sync {
    /// Authoritative cost for a provider request, if available yet
    fn authoritative_cost(&self, provider_request_id: &str) -> AccessResult<Option<f64>>;
}

/// Monthly quota tracker
///
/// Pre-flight checks read the ledger fresh; the cached path is for the
/// usage-status surface only, where a short-TTL stale read is
/// acceptable because usage changes slowly relative to the TTL.
pub struct QuotaTracker {
    catalog: Arc<PlanCatalog>,
    configs: Arc<QuotaConfigStore>,
    ledger: Arc<UsageLedger>,
    cache: Arc<dyn AggregateCache>,
}

impl QuotaTracker {
    /// Create a tracker over its reference data and ledger
    pub fn new(
        catalog: Arc<PlanCatalog>,
        configs: Arc<QuotaConfigStore>,
        ledger: Arc<UsageLedger>,
        cache: Arc<dyn AggregateCache>,
    ) -> Self {
        Self {
            catalog,
            configs,
            ledger,
            cache,
        }
    }

    /// Effective monthly limit for a plan/config pair
    ///
    /// Pure: the custom value applies only when the plan allows custom
    /// limits, otherwise the plan's own limit stands.
    pub fn effective_limit(plan: &TranscriptionPlan, config: &TenantQuotaConfig) -> u64 {
        match config.custom_monthly_limit {
            Some(custom) if plan.allows_custom_limits => custom,
            _ => plan.monthly_minutes_limit,
        }
    }

    /// Whether this tenant may run past its limit
    ///
    /// The tenant flag only applies on plans that permit overage at
    /// all, mirroring the custom-limit gating.
    fn overage_allowed(plan: &TranscriptionPlan, config: &TenantQuotaConfig) -> bool {
        plan.allows_overage && config.overage_allowed
    }

    /// Pre-flight check before starting a metered operation
    ///
    /// At or past the limit: allowed with a warning when overage is
    /// permitted, otherwise denied with the structured quota payload.
    pub fn check_quota(&self, tenant_id: i64) -> AccessResult<QuotaStatus> {
        let now = Utc::now();
        let (plan, config) = self.plan_and_config(tenant_id)?;
        let limit = Self::effective_limit(&plan, &config);
        let used = ceil_minutes(self.ledger.month_usage_seconds(tenant_id, now));
        let overage = Self::overage_allowed(&plan, &config);

        if used >= limit {
            if overage {
                tracing::warn!(
                    tenant_id,
                    used_minutes = used,
                    limit_minutes = limit,
                    "quota exhausted; continuing in overage"
                );
                return Ok(QuotaStatus::new(used, limit, true));
            }
            return Err(AccessError::QuotaExceeded { used, limit });
        }

        Ok(QuotaStatus::new(used, limit, overage))
    }

    /// Usage status for display surfaces, through the TTL cache
    ///
    /// Never used for enforcement; a read may lag recording by up to
    /// the cache TTL.
    pub fn usage_status_cached(&self, tenant_id: i64) -> AccessResult<QuotaStatus> {
        let now = Utc::now();
        let (plan, config) = self.plan_and_config(tenant_id)?;
        let limit = Self::effective_limit(&plan, &config);

        let key = format!("usage:{tenant_id}:{:04}-{:02}", now.year(), now.month());
        let seconds = match self.cache.get(&key) {
            Some(seconds) => seconds,
            None => {
                let seconds = self.ledger.month_usage_seconds(tenant_id, now);
                self.cache.put(key, seconds);
                seconds
            }
        };
        let used = ceil_minutes(seconds);

        Ok(QuotaStatus::new(
            used,
            limit,
            Self::overage_allowed(&plan, &config),
        ))
    }

    /// Record a completed operation reported by the provider
    ///
    /// Idempotent per provider request id; the estimated cost is
    /// `(seconds / 60) * rate(model)` until reconciliation replaces it.
    pub fn record_usage(&self, tenant_id: i64, event: UsageEvent) -> AccessResult<RecordOutcome> {
        let (plan, _) = self.plan_and_config(tenant_id)?;
        let rate = self
            .catalog
            .rate_for_model(&event.model)
            .unwrap_or(plan.cost_per_minute);
        let cost_usd = (event.audio_duration_seconds as f64 / 60.0) * rate;

        let outcome = self.ledger.append(UsageRecord {
            tenant_id,
            operation_id: event.operation_id,
            audio_duration_seconds: event.audio_duration_seconds,
            cost_usd,
            usage_date: event.usage_date,
            provider_request_id: event.provider_request_id.clone(),
        });

        match outcome {
            RecordOutcome::Recorded => {
                tracing::info!(
                    tenant_id,
                    provider_request_id = %event.provider_request_id,
                    seconds = event.audio_duration_seconds,
                    cost_usd,
                    "usage recorded"
                );
            }
            RecordOutcome::Duplicate => {
                tracing::warn!(
                    tenant_id,
                    provider_request_id = %event.provider_request_id,
                    "duplicate usage callback ignored"
                );
            }
        }
        Ok(outcome)
    }

    /// Replace an estimated cost with the provider's authoritative one
    ///
    /// Returns true when the stored cost changed. Estimates within the
    /// tolerance are kept as-is.
    pub fn reconcile_cost(
        &self,
        tenant_id: i64,
        provider_request_id: &str,
        billing: &dyn BillingProvider,
    ) -> AccessResult<bool> {
        let estimated = match self.ledger.cost_of(tenant_id, provider_request_id) {
            Some(cost) => cost,
            None => return Ok(false),
        };
        let authoritative = match billing.authoritative_cost(provider_request_id)? {
            Some(cost) => cost,
            None => return Ok(false),
        };

        if (authoritative - estimated).abs() <= COST_TOLERANCE_USD {
            return Ok(false);
        }

        self.ledger.set_cost(tenant_id, provider_request_id, authoritative);
        tracing::info!(
            tenant_id,
            provider_request_id,
            estimated,
            authoritative,
            "usage cost reconciled"
        );
        Ok(true)
    }

    /// Derived trial expiry for a tenant, `None` off trial plans
    pub fn trial_effective_expiry(&self, tenant_id: i64) -> Option<DateTime<Utc>> {
        let config = self.configs.get(tenant_id)?;
        let plan = self.catalog.get(&config.plan_slug)?;
        if plan.is_trial {
            Some(config.plan_activated_at + Duration::days(plan.trial_days as i64))
        } else {
            None
        }
    }

    fn plan_and_config(
        &self,
        tenant_id: i64,
    ) -> AccessResult<(TranscriptionPlan, TenantQuotaConfig)> {
        let config = self
            .configs
            .get(tenant_id)
            .ok_or(AccessError::QuotaConfigMissing)?;
        let plan = self
            .catalog
            .get(&config.plan_slug)
            .cloned()
            .ok_or_else(|| {
                AccessError::Internal(format!("tenant {tenant_id} bound to unknown plan"))
            })?;
        Ok((plan, config))
    }
}

impl TrialExpirySource for QuotaTracker {
    fn trial_expired(&self, tenant_id: i64, _application: &str, now: DateTime<Utc>) -> bool {
        match self.trial_effective_expiry(tenant_id) {
            Some(expiry) => expiry <= now,
            None => false,
        }
    }
}

/// Partial minutes always round up
fn ceil_minutes(seconds: u64) -> u64 {
    seconds.div_ceil(60)
}
