//! Credential verification and principal construction

use crate::directory::{UserDirectory, UserStatus};
use crate::token::TokenCodec;
use praxia_common::{AccessError, AccessResult, Role};
use praxia_tenant::TenantContext;
use serde::Serialize;
use std::sync::Arc;

/// The authenticated actor making a request
///
/// Status, role, and platform role come from the authoritative store at
/// verification time; `allowed_apps` and `user_type` are
/// credential-carried hints.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    /// User id
    pub user_id: i64,
    /// Owning tenant; `None` for platform admins
    pub tenant_id: Option<i64>,
    /// Email address
    pub email: String,
    /// Tenant role
    pub role: Role,
    /// Platform role, if any
    pub platform_role: Option<String>,
    /// Applications the credential claims access to
    pub allowed_apps: Vec<String>,
    /// User-type hint from the credential
    pub user_type: String,
}

impl Principal {
    /// Whether this principal operates at platform scope
    pub fn is_platform_admin(&self) -> bool {
        self.platform_role.is_some()
    }
}

/// Verifies bearer credentials against the authoritative store
pub struct AuthenticationVerifier {
    codec: TokenCodec,
    directory: Arc<dyn UserDirectory>,
}

impl AuthenticationVerifier {
    /// Create a verifier over a codec and user directory
    pub fn new(codec: TokenCodec, directory: Arc<dyn UserDirectory>) -> Self {
        Self { codec, directory }
    }

    /// Authenticate a request's Authorization header value
    ///
    /// Order matters: signature and expiry first, then the tenant
    /// binding cross-check, then the liveness re-read. A mismatched
    /// tenant binding fails regardless of any other valid claim.
    pub fn authenticate(
        &self,
        authorization: Option<&str>,
        tenant: Option<&TenantContext>,
    ) -> AccessResult<Principal> {
        let header = authorization.ok_or(AccessError::TokenMissing)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AccessError::TokenInvalid)?;

        let claims = self.codec.decode(token)?;

        if let (Some(ctx), Some(bound)) = (tenant, claims.tenant_id) {
            if bound != ctx.id {
                tracing::warn!(
                    token_tenant = bound,
                    resolved_tenant = ctx.id,
                    user_id = claims.sub,
                    "credential tenant binding mismatch"
                );
                return Err(AccessError::TenantMismatch);
            }
        }

        let user = self
            .directory
            .by_id(claims.sub)?
            .ok_or(AccessError::PrincipalInactive)?;
        if user.status != UserStatus::Active {
            tracing::warn!(user_id = user.id, "valid credential for inactive subject");
            return Err(AccessError::PrincipalInactive);
        }

        // The store's tenant binding is authoritative over the claim's.
        if let (Some(ctx), Some(owned)) = (tenant, user.tenant_id) {
            if owned != ctx.id {
                return Err(AccessError::TenantMismatch);
            }
        }

        Ok(Principal {
            user_id: user.id,
            tenant_id: user.tenant_id,
            email: user.email,
            role: user.role,
            platform_role: user.platform_role,
            allowed_apps: claims.allowed_apps,
            user_type: claims.user_type,
        })
    }

    /// Optional variant: identical logic, failures become "no principal"
    ///
    /// For endpoints that behave differently for anonymous callers
    /// without requiring authentication.
    pub fn authenticate_optional(
        &self,
        authorization: Option<&str>,
        tenant: Option<&TenantContext>,
    ) -> Option<Principal> {
        match self.authenticate(authorization, tenant) {
            Ok(principal) => Some(principal),
            Err(err) => {
                tracing::debug!(code = err.code(), "optional authentication yielded no principal");
                None
            }
        }
    }
}
