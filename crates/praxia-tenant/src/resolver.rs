//! Tenant resolution.
//!
//! Resolution order, first match wins: explicit header, subdomain
//! (where enabled), leading path segment (where enabled), compatibility
//! default (behind a flag). On tenant-scoped routes the absence of all
//! of these fails closed.

use crate::model::TenantContext;
use crate::registry::TenantDirectory;
use crate::schema::{schema_for_tenant, SchemaCatalog};
use praxia_common::{AccessError, AccessResult};
use std::sync::Arc;

/// Resolver configuration
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Header carrying the tenant identifier
    pub header_name: String,
    /// Extract the identifier from the Host subdomain
    pub subdomain_enabled: bool,
    /// Base domain subdomains hang off, e.g. `app.praxia.io`
    pub base_domain: Option<String>,
    /// Accept a `/t/{ident}/...` leading path segment
    pub path_segment_enabled: bool,
    /// Compatibility fallback to a fixed identifier
    pub compat_enabled: bool,
    /// Identifier used when the compatibility flag is on
    pub compat_default: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            header_name: "x-tenant-id".to_string(),
            subdomain_enabled: false,
            base_domain: None,
            path_segment_enabled: false,
            compat_enabled: false,
            compat_default: None,
        }
    }
}

/// Whether a route carries tenant identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Requires a resolved tenant context
    TenantScoped,
    /// Platform-level; a tenant identifier is never required
    Platform,
}

/// Static route classification table
///
/// Classification is declared, never inferred from request shape.
pub struct RouteTable {
    platform_prefixes: Vec<String>,
}

impl RouteTable {
    /// Table with the given platform-scoped path prefixes
    pub fn new(platform_prefixes: Vec<String>) -> Self {
        Self { platform_prefixes }
    }

    /// Classify a request path
    pub fn classify(&self, path: &str) -> RouteClass {
        if self
            .platform_prefixes
            .iter()
            .any(|p| path == p || path.starts_with(&format!("{p}/")))
        {
            RouteClass::Platform
        } else {
            RouteClass::TenantScoped
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(vec![
            "/health".to_string(),
            "/ready".to_string(),
            "/api/v1/platform".to_string(),
        ])
    }
}

/// The request fields resolution looks at
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    /// Value of the tenant identity header, if present
    pub tenant_header: Option<String>,
    /// Host header
    pub host: Option<String>,
    /// Request path
    pub path: String,
}

/// Maps request tenant identity to a canonical context
pub struct TenantResolver {
    directory: Arc<dyn TenantDirectory>,
    catalog: Arc<SchemaCatalog>,
    routes: RouteTable,
    config: ResolverConfig,
}

impl TenantResolver {
    /// Create a resolver over a directory and namespace catalog
    pub fn new(
        directory: Arc<dyn TenantDirectory>,
        catalog: Arc<SchemaCatalog>,
        routes: RouteTable,
        config: ResolverConfig,
    ) -> Self {
        Self {
            directory,
            catalog,
            routes,
            config,
        }
    }

    /// Resolve the request's tenant context
    ///
    /// Platform-scoped routes yield `None` without touching the store.
    /// Tenant-scoped routes either yield a context for an active tenant
    /// or fail closed.
    pub fn resolve(&self, req: &RequestMeta) -> AccessResult<Option<TenantContext>> {
        if self.routes.classify(&req.path) == RouteClass::Platform {
            return Ok(None);
        }

        let identifier = self
            .identifier_from(req)
            .ok_or(AccessError::IdentifierMissing)?;

        self.resolve_identifier(&identifier).map(Some)
    }

    /// Resolve a bare identifier to a context
    ///
    /// Resolving the same identifier twice always yields the same
    /// canonical id.
    pub fn resolve_identifier(&self, identifier: &str) -> AccessResult<TenantContext> {
        validate_identifier(identifier)?;

        let record = if identifier.bytes().all(|b| b.is_ascii_digit()) {
            let id: i64 = identifier
                .parse()
                .map_err(|_| AccessError::IdentifierMalformed)?;
            self.directory.by_id(id)?
        } else {
            self.directory.by_slug(identifier)?
        };

        let record = record.ok_or(AccessError::TenantNotFound)?;
        if !record.is_usable() {
            tracing::warn!(tenant_id = record.id, "request for inactive tenant refused");
            return Err(AccessError::TenantInactive);
        }

        let schema = schema_for_tenant(record.id)?;
        self.catalog.ensure_exists(&schema)?;

        tracing::debug!(tenant_id = record.id, slug = %record.slug, "tenant resolved");

        Ok(TenantContext {
            id: record.id,
            slug: record.slug,
            schema_name: schema.as_str().to_string(),
            timezone: record.timezone,
            status: record.status,
        })
    }

    fn identifier_from(&self, req: &RequestMeta) -> Option<String> {
        if let Some(header) = &req.tenant_header {
            return Some(header.trim().to_string());
        }

        if self.config.subdomain_enabled {
            if let Some(sub) = req.host.as_deref().and_then(|h| self.subdomain_of(h)) {
                return Some(sub);
            }
        }

        if self.config.path_segment_enabled {
            if let Some(rest) = req.path.strip_prefix("/t/") {
                let segment = rest.split('/').next().unwrap_or("");
                if !segment.is_empty() {
                    return Some(segment.to_string());
                }
            }
        }

        if self.config.compat_enabled {
            return self.config.compat_default.clone();
        }

        None
    }

    fn subdomain_of(&self, host: &str) -> Option<String> {
        let base = self.config.base_domain.as_deref()?;
        let host = host.split(':').next().unwrap_or(host);
        let sub = host.strip_suffix(base)?.strip_suffix('.')?;
        if sub.is_empty() || sub.contains('.') {
            None
        } else {
            Some(sub.to_string())
        }
    }
}

/// Identifier syntax check, before any lookup
fn validate_identifier(identifier: &str) -> AccessResult<()> {
    let ok = !identifier.is_empty()
        && identifier.len() <= 63
        && identifier
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if ok {
        Ok(())
    } else {
        Err(AccessError::IdentifierMalformed)
    }
}
