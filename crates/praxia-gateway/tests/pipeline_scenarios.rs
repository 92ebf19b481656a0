//! End-to-end scenarios over the wired application state.
//!
//! Seeds a tenant, users, a license, and a quota binding the way
//! provisioning would, then drives requests through the public
//! pipeline surface and asserts the outcomes the error taxonomy
//! promises.

use chrono::Utc;
use praxia_auth::{TokenCodec, TokenConfig, UserRecord, UserStatus};
use praxia_authz::{Entitlement, License, LicenseStatus};
use praxia_common::{AccessError, Capability, Role};
use praxia_gateway::{AppState, GatewayConfig, PendingBilling};
use praxia_quota::{TenantQuotaConfig, UsageEvent};
use praxia_tenant::{schema_for_tenant, RequestMeta, TenantRecord, TenantStatus};
use std::sync::Arc;
use uuid::Uuid;

const SECRET: &str = "scenario-test-secret";

fn provisioned_state() -> Arc<AppState> {
    let state = Arc::new(AppState::new(
        GatewayConfig {
            token: TokenConfig {
                secret: SECRET.into(),
                ..Default::default()
            },
            ..Default::default()
        },
        Arc::new(PendingBilling),
    ));

    state.tenants.insert(TenantRecord {
        id: 10,
        slug: "acme".into(),
        active: true,
        status: TenantStatus::Active,
        timezone: "America/Chicago".into(),
    });
    state.tenants.insert(TenantRecord {
        id: 7,
        slug: "globex".into(),
        active: true,
        status: TenantStatus::Active,
        timezone: "UTC".into(),
    });
    state.schemas.register(&schema_for_tenant(10).unwrap());
    state.schemas.register(&schema_for_tenant(7).unwrap());

    state.users.insert(UserRecord {
        id: 1,
        tenant_id: Some(10),
        email: "ops@acme.example".into(),
        role: Role::Operations,
        platform_role: None,
        status: UserStatus::Active,
    });
    state.users.insert(UserRecord {
        id: 2,
        tenant_id: Some(10),
        email: "owner@acme.example".into(),
        role: Role::Owner,
        platform_role: None,
        status: UserStatus::Active,
    });

    state.licenses.insert(License {
        tenant_id: 10,
        application: "scribe".into(),
        status: LicenseStatus::Active,
        seats_purchased: 3,
        seats_used: 2,
        expires_at: None,
        trial_used: false,
    });
    state.entitlements.insert(Entitlement {
        tenant_id: 10,
        user_id: 1,
        application: "scribe".into(),
        role_in_app: Role::Operations,
        active: true,
        expires_at: None,
    });
    state.entitlements.insert(Entitlement {
        tenant_id: 10,
        user_id: 2,
        application: "scribe".into(),
        role_in_app: Role::Owner,
        active: true,
        expires_at: None,
    });

    state.quota_configs.insert(TenantQuotaConfig {
        tenant_id: 10,
        plan_slug: "starter".into(),
        custom_monthly_limit: None,
        overage_allowed: false,
        plan_activated_at: Utc::now(),
    });

    state
}

fn bearer(user_id: i64, tenant_id: Option<i64>) -> String {
    let codec = TokenCodec::new(TokenConfig {
        secret: SECRET.into(),
        ..Default::default()
    });
    let token = codec
        .issue(user_id, tenant_id, None, vec!["scribe".into()], "clinician")
        .unwrap();
    format!("Bearer {token}")
}

fn meta(tenant_header: Option<&str>, path: &str) -> RequestMeta {
    RequestMeta {
        tenant_header: tenant_header.map(str::to_string),
        host: None,
        path: path.to_string(),
    }
}

#[test]
fn missing_tenant_identity_stops_the_pipeline_cold() {
    let state = provisioned_state();
    let auth = bearer(1, Some(10));

    let err = state
        .pipeline
        .admit(&meta(None, "/api/v1/transcriptions"), Some(&auth))
        .unwrap_err();

    assert_eq!(err, AccessError::IdentifierMissing);
    assert_eq!(err.http_status(), 422);
    assert_eq!(state.tenants.lookup_count(), 0);
    assert_eq!(state.users.lookup_count(), 0);
    assert_eq!(state.licenses.lookup_count(), 0);
    assert!(state.audit.is_empty());
}

#[test]
fn credential_for_another_tenant_is_unauthorized() {
    let state = provisioned_state();
    let auth = bearer(1, Some(10));

    let err = state
        .pipeline
        .admit(&meta(Some("globex"), "/api/v1/transcriptions"), Some(&auth))
        .unwrap_err();

    assert_eq!(err, AccessError::TenantMismatch);
    assert_eq!(err.http_status(), 401);
    assert!(state.audit.is_empty());
}

#[test]
fn suspended_user_is_refused_despite_valid_token() {
    let state = provisioned_state();
    let auth = bearer(1, Some(10));
    state.users.set_status(1, UserStatus::Suspended);

    let err = state
        .pipeline
        .admit(&meta(Some("acme"), "/api/v1/transcriptions"), Some(&auth))
        .unwrap_err();
    assert_eq!(err, AccessError::PrincipalInactive);
}

#[test]
fn operations_user_runs_standard_work_but_not_admin_work() {
    let state = provisioned_state();
    let auth = bearer(1, Some(10));
    let admitted = state
        .pipeline
        .admit(&meta(Some("acme"), "/api/v1/transcriptions"), Some(&auth))
        .unwrap();
    let tenant = admitted.tenant.unwrap();

    let standard = Capability::new("scribe", "note.transcribe", Role::Operations);
    let (quota, conn) = state
        .pipeline
        .begin_metered(&tenant, &admitted.principal, &standard)
        .unwrap();
    assert_eq!(quota.limit_minutes, 600);
    assert_eq!(conn.schema().as_str(), "tenant_10");

    let admin_only = Capability::new("scribe", "settings.update", Role::Admin);
    let err = state
        .pipeline
        .authorize(&tenant, &admitted.principal, &admin_only)
        .unwrap_err();
    assert_eq!(err, AccessError::RoleInsufficient);
    assert_eq!(err.http_status(), 403);

    // Both evaluations were audited, allow and deny alike.
    let entries = state.audit.entries();
    assert_eq!(entries.len(), 2);
    assert!(entries[0].allowed);
    assert_eq!(entries[1].reason, "role_insufficient");
}

#[test]
fn duplicate_provider_callback_never_double_counts() {
    let state = provisioned_state();
    let event = UsageEvent {
        operation_id: Uuid::new_v4(),
        provider_request_id: "prov-123".into(),
        audio_duration_seconds: 61,
        model: "standard".into(),
        usage_date: Utc::now(),
    };

    state.tracker.record_usage(10, event.clone()).unwrap();
    state.tracker.record_usage(10, event).unwrap();

    let status = state.tracker.check_quota(10).unwrap();
    assert_eq!(status.used_minutes, 2); // 61 s rounds up, once
}

#[test]
fn exhausted_quota_denies_with_structured_payload() {
    let state = provisioned_state();
    state
        .tracker
        .record_usage(
            10,
            UsageEvent {
                operation_id: Uuid::new_v4(),
                provider_request_id: "prov-bulk".into(),
                audio_duration_seconds: 600 * 60,
                model: "standard".into(),
                usage_date: Utc::now(),
            },
        )
        .unwrap();

    let auth = bearer(1, Some(10));
    let admitted = state
        .pipeline
        .admit(&meta(Some("acme"), "/api/v1/transcriptions"), Some(&auth))
        .unwrap();
    let tenant = admitted.tenant.unwrap();

    let cap = Capability::new("scribe", "note.transcribe", Role::Operations);
    let err = state
        .pipeline
        .begin_metered(&tenant, &admitted.principal, &cap)
        .unwrap_err();

    assert_eq!(err, AccessError::QuotaExceeded { used: 600, limit: 600 });
    assert_eq!(err.http_status(), 429);
    let meta = err.to_envelope().meta.expect("quota denial carries meta");
    assert_eq!(meta.used, Some(600));
    assert_eq!(meta.limit, Some(600));
    assert_eq!(meta.remaining, Some(0));
}

#[test]
fn owner_grants_the_last_seat_then_capacity_runs_out() {
    let state = provisioned_state();
    let auth = bearer(2, Some(10));
    let admitted = state
        .pipeline
        .admit(&meta(Some("acme"), "/api/v1/seats"), Some(&auth))
        .unwrap();
    let tenant = admitted.tenant.unwrap();

    // Third seat of three.
    let granted = state
        .seats
        .grant_seat(&tenant, &admitted.principal, "scribe", 3, Role::ReadOnly)
        .unwrap();
    assert_eq!(granted.user_id, 3);

    // Fourth seat has no capacity left.
    let err = state
        .seats
        .grant_seat(&tenant, &admitted.principal, "scribe", 4, Role::ReadOnly)
        .unwrap_err();
    assert_eq!(err, AccessError::SeatLimitReached);
}

#[test]
fn no_scope_leaks_after_requests_complete() {
    let state = provisioned_state();
    let auth = bearer(1, Some(10));
    let admitted = state
        .pipeline
        .admit(&meta(Some("acme"), "/api/v1/transcriptions"), Some(&auth))
        .unwrap();
    let tenant = admitted.tenant.unwrap();

    let cap = Capability::new("scribe", "note.transcribe", Role::Operations);
    for _ in 0..5 {
        let (_, conn) = state
            .pipeline
            .begin_metered(&tenant, &admitted.principal, &cap)
            .unwrap();
        drop(conn);
    }

    assert!(!state.pool.has_leaked_scope());
}
