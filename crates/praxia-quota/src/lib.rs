//! Usage metering and monthly quota enforcement.
//!
//! Computes each tenant's effective monthly minute allowance from its
//! plan and overrides, checks consumption before a metered operation
//! starts, and records consumption (with estimated cost) when the
//! provider's completion callback arrives. Recording is idempotent per
//! provider request id; costs are estimated locally and reconciled
//! later against the provider's billing API.
//!
//! The pre-flight check and the recording are deliberately not atomic
//! with each other: concurrent requests can both pass the check before
//! either records. That transient over-consumption is an accepted soft
//! limit, since overage is a first-class state here.

#![warn(missing_docs)]

pub mod config;
pub mod ledger;
pub mod plan;
pub mod tracker;

pub use config::{QuotaConfigStore, TenantQuotaConfig};
pub use ledger::{RecordOutcome, UsageLedger, UsageRecord};
pub use plan::{PlanCatalog, TranscriptionPlan};
pub use tracker::{BillingProvider, QuotaStatus, QuotaTracker, UsageEvent};
