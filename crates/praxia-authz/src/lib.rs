//! Cascading access-decision engine.
//!
//! Given a resolved tenant, an authenticated principal, and a requested
//! capability, runs four ordered short-circuiting layers
//! (license → seat capacity → entitlement → role) and emits an
//! auditable decision with a reason from a fixed vocabulary. The engine
//! never mutates license or entitlement state; seat grants happen in the
//! [`seats::SeatGrantService`] collaborator.

#![warn(missing_docs)]

pub mod audit;
pub mod engine;
pub mod model;
pub mod seats;
pub mod store;

pub use audit::{AuditEntry, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use engine::{AccessDecisionEngine, NoTrialExpiry, TrialExpirySource};
pub use model::{Decision, DecisionReason, Entitlement, License, LicenseStatus};
pub use seats::SeatGrantService;
pub use store::{
    EntitlementStore, InMemoryEntitlementStore, InMemoryLicenseStore, LicenseStore,
};
