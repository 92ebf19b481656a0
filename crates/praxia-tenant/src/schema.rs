//! Schema/namespace mapping.
//!
//! The schema name ends up in SQL identifier position, where parameter
//! binding cannot protect it. It is therefore a deterministic, injective
//! function of the canonical numeric id, re-validated against a strict
//! pattern, and checked against a namespace catalog before any use.
//! Tenant-controlled text never reaches identifier position.

use parking_lot::RwLock;
use praxia_common::{AccessError, AccessResult};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn schema_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("static pattern"))
}

/// Allow-list-validated schema identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaName(String);

impl SchemaName {
    /// Validate a candidate schema identifier
    ///
    /// Rejection is an internal error: every name reaching this point
    /// was produced by [`schema_for_tenant`], so a mismatch means a bug
    /// or corrupted provisioning data, not caller input.
    pub fn parse(raw: &str) -> AccessResult<Self> {
        if raw.len() <= 63 && schema_pattern().is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(AccessError::Internal(format!(
                "schema name failed identifier validation: {raw:?}"
            )))
        }
    }

    /// The validated identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SchemaName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Map a canonical tenant id to its namespace name
///
/// Injective by construction: distinct ids produce distinct names.
pub fn schema_for_tenant(id: i64) -> AccessResult<SchemaName> {
    SchemaName::parse(&format!("tenant_{id}"))
}

/// Catalog of namespaces known to exist in the store
pub struct SchemaCatalog {
    names: RwLock<HashSet<String>>,
}

impl SchemaCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            names: RwLock::new(HashSet::new()),
        }
    }

    /// Register a namespace created by provisioning
    pub fn register(&self, name: &SchemaName) {
        self.names.write().insert(name.as_str().to_string());
    }

    /// Whether the namespace exists
    pub fn contains(&self, name: &SchemaName) -> bool {
        self.names.read().contains(name.as_str())
    }

    /// Fail unless the namespace exists
    pub fn ensure_exists(&self, name: &SchemaName) -> AccessResult<()> {
        if self.contains(name) {
            Ok(())
        } else {
            Err(AccessError::Internal(format!(
                "namespace {name} missing from catalog"
            )))
        }
    }
}

impl Default for SchemaCatalog {
    fn default() -> Self {
        Self::new()
    }
}
