//! Request admission pipeline.
//!
//! Orders the stages every tenant-scoped request passes through:
//! tenant resolution, credential verification, capability
//! authorization, and (for metered operations) the quota pre-flight.
//! Each stage fails closed; a failure at one stage never reaches the
//! next.

use axum::http::{header, HeaderMap};
use praxia_auth::{AuthenticationVerifier, Principal};
use praxia_authz::AccessDecisionEngine;
use praxia_common::{AccessError, AccessResult, Capability};
use praxia_quota::{QuotaStatus, QuotaTracker};
use praxia_tenant::{
    ConnectionPool, RequestMeta, ScopedConnection, SchemaName, TenantContext, TenantResolver,
};
use std::sync::Arc;

/// A request that passed resolution and authentication
#[derive(Debug)]
pub struct AdmittedRequest {
    /// Resolved tenant; `None` on platform-scoped routes
    pub tenant: Option<TenantContext>,
    /// Authenticated caller
    pub principal: Principal,
}

/// Composes the per-request access stages
pub struct RequestPipeline {
    resolver: Arc<TenantResolver>,
    verifier: Arc<AuthenticationVerifier>,
    engine: Arc<AccessDecisionEngine>,
    tracker: Arc<QuotaTracker>,
    pool: Arc<ConnectionPool>,
    tenant_header: String,
}

impl RequestPipeline {
    /// Create a pipeline over its stages
    ///
    /// `tenant_header` must match the resolver's configured header so
    /// extraction and resolution agree on the identifier source.
    pub fn new(
        resolver: Arc<TenantResolver>,
        verifier: Arc<AuthenticationVerifier>,
        engine: Arc<AccessDecisionEngine>,
        tracker: Arc<QuotaTracker>,
        pool: Arc<ConnectionPool>,
        tenant_header: String,
    ) -> Self {
        Self {
            resolver,
            verifier,
            engine,
            tracker,
            pool,
            tenant_header,
        }
    }

    /// Extract the resolution-relevant fields of an HTTP request
    pub fn request_meta(&self, headers: &HeaderMap, path: &str) -> RequestMeta {
        RequestMeta {
            tenant_header: headers
                .get(&self.tenant_header)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            host: headers
                .get(header::HOST)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            path: path.to_string(),
        }
    }

    /// Resolve the tenant, then authenticate against it
    pub fn admit(
        &self,
        meta: &RequestMeta,
        authorization: Option<&str>,
    ) -> AccessResult<AdmittedRequest> {
        let tenant = self.resolver.resolve(meta)?;
        let principal = self.verifier.authenticate(authorization, tenant.as_ref())?;
        Ok(AdmittedRequest { tenant, principal })
    }

    /// Like [`admit`](Self::admit), but an unauthenticated caller is
    /// admitted without a principal instead of being refused
    ///
    /// Tenant resolution failures still fail closed.
    pub fn admit_optional(
        &self,
        meta: &RequestMeta,
        authorization: Option<&str>,
    ) -> AccessResult<(Option<TenantContext>, Option<Principal>)> {
        let tenant = self.resolver.resolve(meta)?;
        let principal = self
            .verifier
            .authenticate_optional(authorization, tenant.as_ref());
        Ok((tenant, principal))
    }

    /// Evaluate a capability, converting denials to taxonomy errors
    pub fn authorize(
        &self,
        tenant: &TenantContext,
        principal: &Principal,
        capability: &Capability,
    ) -> AccessResult<()> {
        let decision = self.engine.authorize(tenant, principal, capability)?;
        match decision.to_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Admit a metered operation: authorize, pre-flight the quota, and
    /// hand back a connection scoped to the tenant's namespace
    pub fn begin_metered(
        &self,
        tenant: &TenantContext,
        principal: &Principal,
        capability: &Capability,
    ) -> AccessResult<(QuotaStatus, ScopedConnection)> {
        self.authorize(tenant, principal, capability)?;
        let status = self.tracker.check_quota(tenant.id)?;

        let schema = SchemaName::parse(&tenant.schema_name)?;
        let conn = self.pool.acquire(schema);
        Ok((status, conn))
    }

    /// Cached usage view for display surfaces
    pub fn usage_status(&self, tenant: &TenantContext) -> AccessResult<QuotaStatus> {
        self.tracker.usage_status_cached(tenant.id)
    }

    /// The tenant context is mandatory past admission on scoped routes
    pub fn require_tenant(tenant: Option<TenantContext>) -> AccessResult<TenantContext> {
        tenant.ok_or(AccessError::IdentifierMissing)
    }
}
