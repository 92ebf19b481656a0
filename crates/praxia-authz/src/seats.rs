//! Seat grant collaborator.
//!
//! The decision engine only answers whether a grant may proceed; the
//! actual seat increment and entitlement creation happen here, as a
//! single check-and-increment under the store's write lock.

use crate::engine::AccessDecisionEngine;
use crate::model::Entitlement;
use crate::store::InMemoryLicenseStore;
use praxia_auth::Principal;
use praxia_common::{AccessResult, Capability, Role};
use praxia_tenant::TenantContext;
use std::sync::Arc;

/// Grants seats within a licensed application
pub struct SeatGrantService {
    engine: Arc<AccessDecisionEngine>,
    licenses: Arc<InMemoryLicenseStore>,
    entitlements: Arc<crate::store::InMemoryEntitlementStore>,
}

impl SeatGrantService {
    /// Create a service over the engine and the mutable stores
    pub fn new(
        engine: Arc<AccessDecisionEngine>,
        licenses: Arc<InMemoryLicenseStore>,
        entitlements: Arc<crate::store::InMemoryEntitlementStore>,
    ) -> Self {
        Self {
            engine,
            licenses,
            entitlements,
        }
    }

    /// Grant a seat to `target_user` with the given in-app role
    ///
    /// Authorizes the grant capability for the acting principal, then
    /// consumes a seat and writes the entitlement row. The capacity
    /// re-check inside [`InMemoryLicenseStore::try_consume_seat`] makes
    /// concurrent grants race safely on the store lock rather than on
    /// the engine's earlier read.
    pub fn grant_seat(
        &self,
        tenant: &TenantContext,
        acting: &Principal,
        application: &str,
        target_user: i64,
        role_in_app: Role,
    ) -> AccessResult<Entitlement> {
        let decision =
            self.engine
                .authorize(tenant, acting, &Capability::grant_seat(application))?;
        if let Some(err) = decision.to_error() {
            return Err(err);
        }

        self.licenses.try_consume_seat(tenant.id, application)?;

        let entitlement = Entitlement {
            tenant_id: tenant.id,
            user_id: target_user,
            application: application.to_string(),
            role_in_app,
            active: true,
            expires_at: None,
        };
        self.entitlements.insert(entitlement.clone());

        tracing::info!(
            tenant_id = tenant.id,
            user_id = target_user,
            application,
            "seat granted"
        );
        Ok(entitlement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::InMemoryAuditSink;
    use crate::engine::NoTrialExpiry;
    use crate::model::{License, LicenseStatus};
    use crate::store::InMemoryEntitlementStore;
    use praxia_common::AccessError;
    use praxia_tenant::TenantStatus;

    fn tenant() -> TenantContext {
        TenantContext {
            id: 10,
            slug: "acme".into(),
            schema_name: "tenant_10".into(),
            timezone: "UTC".into(),
            status: TenantStatus::Active,
        }
    }

    fn admin() -> Principal {
        Principal {
            user_id: 1,
            tenant_id: Some(10),
            email: "admin@acme.test".into(),
            role: Role::Admin,
            platform_role: None,
            allowed_apps: vec!["tq".into()],
            user_type: "staff".into(),
        }
    }

    fn service(seats_purchased: u32, seats_used: u32) -> SeatGrantService {
        let licenses = Arc::new(InMemoryLicenseStore::new());
        licenses.insert(License {
            tenant_id: 10,
            application: "tq".into(),
            status: LicenseStatus::Active,
            seats_purchased,
            seats_used,
            expires_at: None,
            trial_used: false,
        });
        let entitlements = Arc::new(InMemoryEntitlementStore::new());
        entitlements.insert(Entitlement {
            tenant_id: 10,
            user_id: 1,
            application: "tq".into(),
            role_in_app: Role::Admin,
            active: true,
            expires_at: None,
        });
        let engine = Arc::new(AccessDecisionEngine::new(
            licenses.clone(),
            entitlements.clone(),
            Arc::new(InMemoryAuditSink::new()),
            Arc::new(NoTrialExpiry),
        ));
        SeatGrantService::new(engine, licenses, entitlements)
    }

    #[test]
    fn test_grant_creates_entitlement_and_consumes_seat() {
        let service = service(2, 1);
        let entitlement = service
            .grant_seat(&tenant(), &admin(), "tq", 7, Role::Operations)
            .unwrap();
        assert_eq!(entitlement.user_id, 7);
        assert!(entitlement.active);

        // Capacity is now exhausted.
        let err = service
            .grant_seat(&tenant(), &admin(), "tq", 8, Role::Operations)
            .unwrap_err();
        assert_eq!(err, AccessError::SeatLimitReached);
    }

    #[test]
    fn test_full_license_denies_grant() {
        let service = service(1, 1);
        let err = service
            .grant_seat(&tenant(), &admin(), "tq", 7, Role::Operations)
            .unwrap_err();
        assert_eq!(err, AccessError::SeatLimitReached);
    }
}
