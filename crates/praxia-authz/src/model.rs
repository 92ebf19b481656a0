//! License, entitlement, and decision model

use chrono::{DateTime, Utc};
use praxia_common::{AccessError, Role};
use serde::{Deserialize, Serialize};

/// Billing status of a tenant-application license
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseStatus {
    /// Grant in force
    Active,
    /// Temporarily blocked by the platform
    Suspended,
    /// Payment overdue; blocked like suspended
    PastDue,
    /// Grant ran out
    Expired,
    /// Grant terminated
    Cancelled,
}

/// Tenant-level grant of access to one application
///
/// Mutated by provisioning and billing flows, read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
    /// Owning tenant
    pub tenant_id: i64,
    /// Application slug
    pub application: String,
    /// Billing status
    pub status: LicenseStatus,
    /// Seats purchased
    pub seats_purchased: u32,
    /// Seats granted so far
    pub seats_used: u32,
    /// Expiry; `None` means no expiry
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the tenant already consumed its trial
    pub trial_used: bool,
}

/// User-level grant within an already-licensed application
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entitlement {
    /// Owning tenant
    pub tenant_id: i64,
    /// Entitled user
    pub user_id: i64,
    /// Application slug
    pub application: String,
    /// Role the user holds inside this application
    pub role_in_app: Role,
    /// Whether the grant is in force
    pub active: bool,
    /// Expiry; `None` means no expiry
    pub expires_at: Option<DateTime<Utc>>,
}

/// Fixed decision-reason vocabulary
///
/// Closed set; audit entries and tests match on these, never on prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// All layers passed
    Allowed,
    /// No license row for the application
    LicenseMissing,
    /// License expired (stored or derived trial expiry)
    LicenseExpired,
    /// License suspended or past due
    LicenseSuspended,
    /// No free seat to grant
    SeatLimitReached,
    /// No entitlement row, or the row is inactive
    EntitlementMissing,
    /// Entitlement expired
    EntitlementExpired,
    /// Role below the capability's minimum
    RoleInsufficient,
}

impl DecisionReason {
    /// Stable code for audit entries
    pub fn code(&self) -> &'static str {
        match self {
            Self::Allowed => "allowed",
            Self::LicenseMissing => "license_missing",
            Self::LicenseExpired => "license_expired",
            Self::LicenseSuspended => "license_suspended",
            Self::SeatLimitReached => "seat_limit_reached",
            Self::EntitlementMissing => "entitlement_missing",
            Self::EntitlementExpired => "entitlement_expired",
            Self::RoleInsufficient => "role_insufficient",
        }
    }
}

/// Outcome of one engine evaluation
///
/// Computed fresh per request; logged, never persisted or cached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decision {
    /// Whether the capability may proceed
    pub allowed: bool,
    /// Why
    pub reason: DecisionReason,
    /// Layer that produced the outcome (1..=4)
    pub layer: u8,
}

impl Decision {
    /// Allow at the given layer
    pub fn allow(layer: u8) -> Self {
        Self {
            allowed: true,
            reason: DecisionReason::Allowed,
            layer,
        }
    }

    /// Deny at the given layer
    pub fn deny(reason: DecisionReason, layer: u8) -> Self {
        Self {
            allowed: false,
            reason,
            layer,
        }
    }

    /// The pipeline error for a denial, `None` when allowed
    pub fn to_error(&self) -> Option<AccessError> {
        if self.allowed {
            return None;
        }
        Some(match self.reason {
            DecisionReason::Allowed => AccessError::Internal("denial without a deny reason".into()),
            DecisionReason::LicenseMissing => AccessError::LicenseMissing,
            DecisionReason::LicenseExpired => AccessError::LicenseExpired,
            DecisionReason::LicenseSuspended => AccessError::LicenseSuspended,
            DecisionReason::SeatLimitReached => AccessError::SeatLimitReached,
            DecisionReason::EntitlementMissing => AccessError::EntitlementMissing,
            DecisionReason::EntitlementExpired => AccessError::EntitlementExpired,
            DecisionReason::RoleInsufficient => AccessError::RoleInsufficient,
        })
    }
}
