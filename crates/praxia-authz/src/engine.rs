//! The four-layer decision engine.
//!
//! Layer order encodes a cost and frequency-of-denial priority:
//! the license check is cheapest and denies most often, so it runs
//! first; the role check runs last. Layers are sequential and
//! short-circuit on the first denial.

use crate::audit::{AuditEntry, AuditSink};
use crate::model::{Decision, DecisionReason, LicenseStatus};
use crate::store::{EntitlementStore, LicenseStore};
use chrono::{DateTime, Utc};
use praxia_auth::Principal;
use praxia_common::{AccessResult, Capability, CapabilityKind};
use praxia_tenant::TenantContext;
use std::sync::Arc;
use uuid::Uuid;

/// Source of derived trial expiry
///
/// A trial's effective expiry is computed from plan activation plus
/// trial days, not read from the stored license status, so a tenant
/// whose trial lapsed minutes ago is unlicensed even before the
/// periodic sweep corrects the status column.
pub trait TrialExpirySource: Send + Sync {
    /// Whether the tenant's trial for the application has lapsed
    fn trial_expired(&self, tenant_id: i64, application: &str, now: DateTime<Utc>) -> bool;
}

/// Expiry source for deployments without trial plans
pub struct NoTrialExpiry;

impl TrialExpirySource for NoTrialExpiry {
    fn trial_expired(&self, _tenant_id: i64, _application: &str, _now: DateTime<Utc>) -> bool {
        false
    }
}

/// Cascading access-decision engine
///
/// Pure with respect to license/entitlement state: it reads, decides,
/// and audits. Decisions are computed fresh per request and never
/// cached across requests.
pub struct AccessDecisionEngine {
    licenses: Arc<dyn LicenseStore>,
    entitlements: Arc<dyn EntitlementStore>,
    audit: Arc<dyn AuditSink>,
    trial: Arc<dyn TrialExpirySource>,
}

impl AccessDecisionEngine {
    /// Create an engine over its stores and audit sink
    pub fn new(
        licenses: Arc<dyn LicenseStore>,
        entitlements: Arc<dyn EntitlementStore>,
        audit: Arc<dyn AuditSink>,
        trial: Arc<dyn TrialExpirySource>,
    ) -> Self {
        Self {
            licenses,
            entitlements,
            audit,
            trial,
        }
    }

    /// Evaluate a capability for a principal within a tenant
    ///
    /// Every evaluation, allow or deny, lands in the audit sink with a
    /// closed-vocabulary reason. `Err` is reserved for store faults.
    pub fn authorize(
        &self,
        tenant: &TenantContext,
        principal: &Principal,
        capability: &Capability,
    ) -> AccessResult<Decision> {
        let decision = self.evaluate(tenant, principal, capability)?;
        self.audit.append(AuditEntry {
            id: Uuid::new_v4(),
            tenant_id: tenant.id,
            user_id: principal.user_id,
            capability: format!("{}:{}", capability.application, capability.action),
            allowed: decision.allowed,
            reason: decision.reason.code(),
            layer: decision.layer,
            at: Utc::now(),
        });
        Ok(decision)
    }

    fn evaluate(
        &self,
        tenant: &TenantContext,
        principal: &Principal,
        capability: &Capability,
    ) -> AccessResult<Decision> {
        let now = Utc::now();

        // Layer 1: license
        let license = match self.licenses.license(tenant.id, &capability.application)? {
            Some(license) => license,
            None => return Ok(Decision::deny(DecisionReason::LicenseMissing, 1)),
        };
        match license.status {
            LicenseStatus::Active => {}
            LicenseStatus::Suspended | LicenseStatus::PastDue => {
                return Ok(Decision::deny(DecisionReason::LicenseSuspended, 1));
            }
            LicenseStatus::Expired | LicenseStatus::Cancelled => {
                return Ok(Decision::deny(DecisionReason::LicenseExpired, 1));
            }
        }
        if let Some(expires_at) = license.expires_at {
            if expires_at <= now {
                return Ok(Decision::deny(DecisionReason::LicenseExpired, 1));
            }
        }
        if self.trial.trial_expired(tenant.id, &capability.application, now) {
            return Ok(Decision::deny(DecisionReason::LicenseExpired, 1));
        }

        // Layer 2: seat capacity, only when granting a new seat
        if capability.kind == CapabilityKind::GrantSeat
            && license.seats_used >= license.seats_purchased
        {
            return Ok(Decision::deny(DecisionReason::SeatLimitReached, 2));
        }

        // Platform admins administer tenants without holding entitlements.
        if principal.is_platform_admin() {
            return Ok(Decision::allow(2));
        }

        // Layer 3: entitlement
        let entitlement =
            match self
                .entitlements
                .entitlement(tenant.id, principal.user_id, &capability.application)?
            {
                Some(row) if row.active => row,
                _ => return Ok(Decision::deny(DecisionReason::EntitlementMissing, 3)),
            };
        if let Some(expires_at) = entitlement.expires_at {
            if expires_at <= now {
                return Ok(Decision::deny(DecisionReason::EntitlementExpired, 3));
            }
        }

        // Layer 4: role
        let meets = principal.role.meets(capability.min_role)
            || entitlement.role_in_app.meets(capability.min_role);
        if !meets {
            return Ok(Decision::deny(DecisionReason::RoleInsufficient, 4));
        }

        Ok(Decision::allow(4))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::InMemoryAuditSink;
    use crate::model::{Entitlement, License};
    use crate::store::{InMemoryEntitlementStore, InMemoryLicenseStore};
    use chrono::Duration;
    use praxia_common::Role;
    use praxia_tenant::TenantStatus;

    struct Fixture {
        licenses: Arc<InMemoryLicenseStore>,
        entitlements: Arc<InMemoryEntitlementStore>,
        audit: Arc<InMemoryAuditSink>,
        engine: AccessDecisionEngine,
    }

    fn fixture() -> Fixture {
        let licenses = Arc::new(InMemoryLicenseStore::new());
        let entitlements = Arc::new(InMemoryEntitlementStore::new());
        let audit = Arc::new(InMemoryAuditSink::new());
        let engine = AccessDecisionEngine::new(
            licenses.clone(),
            entitlements.clone(),
            audit.clone(),
            Arc::new(NoTrialExpiry),
        );
        Fixture {
            licenses,
            entitlements,
            audit,
            engine,
        }
    }

    fn tenant() -> TenantContext {
        TenantContext {
            id: 10,
            slug: "acme".into(),
            schema_name: "tenant_10".into(),
            timezone: "UTC".into(),
            status: TenantStatus::Active,
        }
    }

    fn principal(role: Role) -> Principal {
        Principal {
            user_id: 1,
            tenant_id: Some(10),
            email: "u1@acme.test".into(),
            role,
            platform_role: None,
            allowed_apps: vec!["tq".into()],
            user_type: "staff".into(),
        }
    }

    fn active_license(seats_purchased: u32, seats_used: u32) -> License {
        License {
            tenant_id: 10,
            application: "tq".into(),
            status: LicenseStatus::Active,
            seats_purchased,
            seats_used,
            expires_at: None,
            trial_used: false,
        }
    }

    fn entitlement(role_in_app: Role) -> Entitlement {
        Entitlement {
            tenant_id: 10,
            user_id: 1,
            application: "tq".into(),
            role_in_app,
            active: true,
            expires_at: None,
        }
    }

    #[test]
    fn test_missing_license_short_circuits_later_layers() {
        let f = fixture();
        let decision = f
            .engine
            .authorize(
                &tenant(),
                &principal(Role::Admin),
                &Capability::new("tq", "note.create", Role::Operations),
            )
            .unwrap();

        assert_eq!(decision, Decision::deny(DecisionReason::LicenseMissing, 1));
        assert_eq!(f.licenses.lookup_count(), 1);
        assert_eq!(f.entitlements.lookup_count(), 0);
    }

    #[test]
    fn test_suspended_and_expired_are_distinct() {
        let f = fixture();
        let mut license = active_license(5, 1);
        license.status = LicenseStatus::PastDue;
        f.licenses.insert(license);

        let cap = Capability::new("tq", "note.create", Role::Operations);
        let decision = f.engine.authorize(&tenant(), &principal(Role::Admin), &cap).unwrap();
        assert_eq!(decision.reason, DecisionReason::LicenseSuspended);

        f.licenses.set_status(10, "tq", LicenseStatus::Expired);
        let decision = f.engine.authorize(&tenant(), &principal(Role::Admin), &cap).unwrap();
        assert_eq!(decision.reason, DecisionReason::LicenseExpired);
    }

    #[test]
    fn test_stored_expiry_in_past_denies() {
        let f = fixture();
        let mut license = active_license(5, 1);
        license.expires_at = Some(Utc::now() - Duration::days(1));
        f.licenses.insert(license);

        let decision = f
            .engine
            .authorize(
                &tenant(),
                &principal(Role::Admin),
                &Capability::new("tq", "note.create", Role::Operations),
            )
            .unwrap();
        assert_eq!(decision.reason, DecisionReason::LicenseExpired);
    }

    #[test]
    fn test_seat_layer_gates_only_new_grants() {
        let f = fixture();
        f.licenses.insert(active_license(1, 1));
        f.entitlements.insert(entitlement(Role::Admin));

        let grant = f
            .engine
            .authorize(
                &tenant(),
                &principal(Role::Admin),
                &Capability::grant_seat("tq"),
            )
            .unwrap();
        assert_eq!(grant, Decision::deny(DecisionReason::SeatLimitReached, 2));

        // Using the already-granted seat is unaffected.
        let usage = f
            .engine
            .authorize(
                &tenant(),
                &principal(Role::Admin),
                &Capability::new("tq", "note.create", Role::Operations),
            )
            .unwrap();
        assert!(usage.allowed);
    }

    #[test]
    fn test_role_layer_denies_admin_capability_for_operations() {
        let f = fixture();
        f.licenses.insert(active_license(5, 1));
        f.entitlements.insert(entitlement(Role::Operations));

        let admin_only = Capability::new("tq", "settings.update", Role::Admin);
        let decision = f
            .engine
            .authorize(&tenant(), &principal(Role::Operations), &admin_only)
            .unwrap();
        assert_eq!(decision, Decision::deny(DecisionReason::RoleInsufficient, 4));

        let standard = Capability::new("tq", "note.create", Role::Operations);
        let decision = f
            .engine
            .authorize(&tenant(), &principal(Role::Operations), &standard)
            .unwrap();
        assert!(decision.allowed);
    }

    #[test]
    fn test_inactive_entitlement_is_missing_not_expired() {
        let f = fixture();
        f.licenses.insert(active_license(5, 1));
        let mut row = entitlement(Role::Admin);
        row.active = false;
        f.entitlements.insert(row);

        let decision = f
            .engine
            .authorize(
                &tenant(),
                &principal(Role::Admin),
                &Capability::new("tq", "note.create", Role::Operations),
            )
            .unwrap();
        assert_eq!(decision.reason, DecisionReason::EntitlementMissing);
    }

    #[test]
    fn test_expired_entitlement() {
        let f = fixture();
        f.licenses.insert(active_license(5, 1));
        let mut row = entitlement(Role::Admin);
        row.expires_at = Some(Utc::now() - Duration::hours(1));
        f.entitlements.insert(row);

        let decision = f
            .engine
            .authorize(
                &tenant(),
                &principal(Role::Admin),
                &Capability::new("tq", "note.create", Role::Operations),
            )
            .unwrap();
        assert_eq!(decision.reason, DecisionReason::EntitlementExpired);
    }

    #[test]
    fn test_every_evaluation_is_audited() {
        let f = fixture();
        f.licenses.insert(active_license(5, 1));
        f.entitlements.insert(entitlement(Role::Operations));

        let cap = Capability::new("tq", "note.create", Role::Operations);
        f.engine.authorize(&tenant(), &principal(Role::Operations), &cap).unwrap();
        f.engine
            .authorize(
                &tenant(),
                &principal(Role::Operations),
                &Capability::new("tq", "settings.update", Role::Admin),
            )
            .unwrap();

        let entries = f.audit.entries();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].allowed);
        assert_eq!(entries[1].reason, "role_insufficient");
        assert_eq!(entries[1].capability, "tq:settings.update");
    }

    #[test]
    fn test_derived_trial_expiry_overrides_stored_status() {
        struct AlwaysLapsed;
        impl TrialExpirySource for AlwaysLapsed {
            fn trial_expired(&self, _: i64, _: &str, _: DateTime<Utc>) -> bool {
                true
            }
        }

        let licenses = Arc::new(InMemoryLicenseStore::new());
        licenses.insert(active_license(5, 1));
        let entitlements = Arc::new(InMemoryEntitlementStore::new());
        entitlements.insert(entitlement(Role::Admin));
        let engine = AccessDecisionEngine::new(
            licenses,
            entitlements,
            Arc::new(InMemoryAuditSink::new()),
            Arc::new(AlwaysLapsed),
        );

        let decision = engine
            .authorize(
                &tenant(),
                &principal(Role::Admin),
                &Capability::new("tq", "note.create", Role::Operations),
            )
            .unwrap();
        assert_eq!(decision, Decision::deny(DecisionReason::LicenseExpired, 1));
    }

    #[test]
    fn test_platform_admin_skips_entitlement_layers() {
        let f = fixture();
        f.licenses.insert(active_license(5, 1));

        let admin = Principal {
            user_id: 99,
            tenant_id: None,
            email: "ops@praxia.test".into(),
            role: Role::Owner,
            platform_role: Some("super_admin".into()),
            allowed_apps: vec![],
            user_type: "platform".into(),
        };

        let decision = f
            .engine
            .authorize(
                &tenant(),
                &admin,
                &Capability::new("tq", "settings.update", Role::Admin),
            )
            .unwrap();
        assert!(decision.allowed);
        assert_eq!(f.entitlements.lookup_count(), 0);
    }
}
