//! Capability and role model.
//!
//! A capability names the application it belongs to, the action it
//! performs, whether it grants a new seat, and the minimum role that may
//! exercise it. The decision engine evaluates capabilities; it never
//! inspects route paths.

use serde::{Deserialize, Serialize};

/// Tenant-user role, ordered from least to most privileged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Read-only access
    ReadOnly,
    /// Day-to-day operational access
    Operations,
    /// Tenant administration
    Admin,
    /// Account owner
    Owner,
}

impl Role {
    /// Numeric rank for minimum-role comparisons
    pub fn rank(&self) -> u8 {
        match self {
            Self::ReadOnly => 0,
            Self::Operations => 1,
            Self::Admin => 2,
            Self::Owner => 3,
        }
    }

    /// Whether this role meets the given minimum
    pub fn meets(&self, minimum: Role) -> bool {
        self.rank() >= minimum.rank()
    }
}

/// What exercising the capability does to seat accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    /// Uses an already-granted seat; seat capacity is not checked
    Use,
    /// Grants a new seat; checked against purchased seat capacity
    GrantSeat,
}

/// A requested capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// Application slug the capability belongs to (e.g. "tq")
    pub application: String,
    /// Action name, for audit entries
    pub action: String,
    /// Seat-accounting kind
    pub kind: CapabilityKind,
    /// Minimum role required to exercise it
    pub min_role: Role,
}

impl Capability {
    /// Ordinary capability using an existing seat
    pub fn new(application: &str, action: &str, min_role: Role) -> Self {
        Self {
            application: application.to_string(),
            action: action.to_string(),
            kind: CapabilityKind::Use,
            min_role,
        }
    }

    /// Capability that grants a new seat in the application
    pub fn grant_seat(application: &str) -> Self {
        Self {
            application: application.to_string(),
            action: "seat.grant".to_string(),
            kind: CapabilityKind::GrantSeat,
            min_role: Role::Admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Admin.meets(Role::Operations));
        assert!(Role::Operations.meets(Role::Operations));
        assert!(!Role::Operations.meets(Role::Admin));
        assert!(Role::Owner.meets(Role::Admin));
        assert!(!Role::ReadOnly.meets(Role::Operations));
    }

    #[test]
    fn test_grant_seat_defaults() {
        let cap = Capability::grant_seat("tq");
        assert_eq!(cap.kind, CapabilityKind::GrantSeat);
        assert_eq!(cap.min_role, Role::Admin);
        assert_eq!(cap.application, "tq");
    }
}
