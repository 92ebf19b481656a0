//! Closed error taxonomy for the request pipeline.
//!
//! Every failure the pipeline can surface is one of these variants.
//! Callers and tests match on the variant (or its stable wire code),
//! never on message text.

use serde::Serialize;
use thiserror::Error;

/// Result type for pipeline operations
pub type AccessResult<T> = Result<T, AccessError>;

/// Pipeline error taxonomy
///
/// Variants are ordered by pipeline stage: tenant resolution,
/// authentication, authorization layers, quota.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccessError {
    /// Tenant identity required but absent from the request
    #[error("tenant identifier required on this route")]
    IdentifierMissing,

    /// Tenant identity present but syntactically invalid
    #[error("tenant identifier is malformed")]
    IdentifierMalformed,

    /// No tenant registered under the given identifier
    #[error("tenant not found")]
    TenantNotFound,

    /// Tenant exists but is cancelled
    #[error("tenant is not active")]
    TenantInactive,

    /// No bearer credential on the request
    #[error("bearer credential missing")]
    TokenMissing,

    /// Credential failed signature or claim validation
    #[error("bearer credential invalid")]
    TokenInvalid,

    /// Credential was valid once but has expired
    #[error("bearer credential expired")]
    TokenExpired,

    /// Credential is bound to a different tenant than the resolved one
    #[error("credential tenant does not match resolved tenant")]
    TenantMismatch,

    /// Subject of the credential is no longer active
    #[error("principal is not active")]
    PrincipalInactive,

    /// Tenant holds no license for the capability's application
    #[error("no license for application")]
    LicenseMissing,

    /// License exists but has expired (stored or derived trial expiry)
    #[error("license expired")]
    LicenseExpired,

    /// License exists but is suspended or past due
    #[error("license suspended")]
    LicenseSuspended,

    /// All purchased seats are already granted
    #[error("seat limit reached")]
    SeatLimitReached,

    /// User holds no entitlement within the licensed application
    #[error("no entitlement for application")]
    EntitlementMissing,

    /// Entitlement exists but has expired
    #[error("entitlement expired")]
    EntitlementExpired,

    /// Role does not meet the capability's minimum
    #[error("role does not meet capability requirement")]
    RoleInsufficient,

    /// Monthly metered quota exhausted and overage not allowed
    #[error("monthly quota exceeded: {used} of {limit} minutes used")]
    QuotaExceeded {
        /// Minutes consumed this calendar month
        used: u64,
        /// Effective monthly limit in minutes
        limit: u64,
    },

    /// Tenant has no quota configuration row
    #[error("no quota configuration for tenant")]
    QuotaConfigMissing,

    /// Infrastructure failure; detail is logged server-side only
    #[error("internal error")]
    Internal(String),
}

impl AccessError {
    /// Stable wire code for the variant
    pub fn code(&self) -> &'static str {
        match self {
            Self::IdentifierMissing => "identifier_missing",
            Self::IdentifierMalformed => "identifier_malformed",
            Self::TenantNotFound => "tenant_not_found",
            Self::TenantInactive => "tenant_inactive",
            Self::TokenMissing => "token_missing",
            Self::TokenInvalid => "token_invalid",
            Self::TokenExpired => "token_expired",
            Self::TenantMismatch => "tenant_mismatch",
            Self::PrincipalInactive => "principal_inactive",
            Self::LicenseMissing => "license_missing",
            Self::LicenseExpired => "license_expired",
            Self::LicenseSuspended => "license_suspended",
            Self::SeatLimitReached => "seat_limit_reached",
            Self::EntitlementMissing => "entitlement_missing",
            Self::EntitlementExpired => "entitlement_expired",
            Self::RoleInsufficient => "role_insufficient",
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::QuotaConfigMissing => "quota_config_missing",
            Self::Internal(_) => "internal_error",
        }
    }

    /// HTTP status for the variant
    ///
    /// 401 authentication, 403 authorization, 400/422 tenant identity,
    /// 404 unknown/inactive tenant, 429 quota, 500 infrastructure.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::IdentifierMissing => 422,
            Self::IdentifierMalformed => 400,
            Self::TenantNotFound | Self::TenantInactive => 404,
            Self::TokenMissing
            | Self::TokenInvalid
            | Self::TokenExpired
            | Self::TenantMismatch
            | Self::PrincipalInactive => 401,
            Self::LicenseMissing
            | Self::LicenseExpired
            | Self::LicenseSuspended
            | Self::SeatLimitReached
            | Self::EntitlementMissing
            | Self::EntitlementExpired
            | Self::RoleInsufficient
            | Self::QuotaConfigMissing => 403,
            Self::QuotaExceeded { .. } => 429,
            Self::Internal(_) => 500,
        }
    }

    /// Build the wire envelope for this error
    pub fn to_envelope(&self) -> ErrorEnvelope {
        let meta = match self {
            Self::QuotaExceeded { used, limit } => Some(ErrorMeta {
                code: self.code().to_string(),
                used: Some(*used),
                limit: Some(*limit),
                remaining: Some(limit.saturating_sub(*used)),
            }),
            _ => None,
        };

        // The internal detail never leaves the process.
        let message = match self {
            Self::Internal(_) => "internal error".to_string(),
            other => other.to_string(),
        };

        ErrorEnvelope {
            error: ErrorBody {
                code: self.code().to_string(),
                message,
            },
            meta,
        }
    }
}

/// Uniform JSON denial envelope
#[derive(Debug, Clone, Serialize)]
pub struct ErrorEnvelope {
    /// Primary error body
    pub error: ErrorBody,
    /// Structured extras, present for quota denials
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ErrorMeta>,
}

/// Error code and human-readable message
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Stable wire code
    pub code: String,
    /// Human-readable message (not for programmatic matching)
    pub message: String,
}

/// Structured metadata for quota denials
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMeta {
    /// Wire code, repeated for clients that only read meta
    pub code: String,
    /// Minutes used this month
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used: Option<u64>,
    /// Effective monthly limit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    /// Minutes remaining (zero when exhausted)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u64>,
}
