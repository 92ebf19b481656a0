//! Tenant resolution and isolation boundary.
//!
//! Maps a request's tenant identifier (header, subdomain, path segment,
//! or compatibility default) to a canonical `TenantContext`, validates
//! the derived schema name against an allow-list catalog, and scopes
//! pooled connections to the tenant's namespace for the lifetime of a
//! single request.
//!
//! Once a request is past the resolver, every downstream component uses
//! only the canonical numeric id; nothing re-derives identity from a
//! slug.

#![warn(missing_docs)]

pub mod model;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod scope;

pub use model::{TenantContext, TenantRecord, TenantStatus};
pub use registry::{InMemoryTenantRegistry, TenantDirectory};
pub use resolver::{RequestMeta, ResolverConfig, RouteClass, RouteTable, TenantResolver};
pub use schema::{schema_for_tenant, SchemaCatalog, SchemaName};
pub use scope::{ConnectionPool, ScopedConnection};
