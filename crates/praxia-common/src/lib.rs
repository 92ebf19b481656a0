//! Shared types for the Praxia platform.
//!
//! Everything here is consumed by at least two pipeline crates:
//! the closed error taxonomy and its wire envelope, the capability/role
//! model, and the injected aggregate-cache abstraction.

#![warn(missing_docs)]

pub mod cache;
pub mod capability;
pub mod error;

pub use capability::{Capability, CapabilityKind, Role};
pub use error::{AccessError, AccessResult, ErrorEnvelope};
