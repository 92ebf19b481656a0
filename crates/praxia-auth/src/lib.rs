//! Bearer credential verification.
//!
//! Validates a signed, time-bound JWT, re-reads the subject's status
//! from the authoritative user directory, cross-checks the credential's
//! tenant binding against the resolved tenant context, and produces the
//! request's `Principal`. Token possession alone is never sufficient.

#![warn(missing_docs)]

pub mod directory;
pub mod token;
pub mod verifier;

pub use directory::{InMemoryUserDirectory, UserDirectory, UserRecord, UserStatus};
pub use token::{Claims, TokenCodec, TokenConfig};
pub use verifier::{AuthenticationVerifier, Principal};
