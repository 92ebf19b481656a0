//! Praxia API gateway
//!
//! Composes the access pipeline every tenant request passes through:
//! tenant resolution, credential verification, the layered capability
//! decision, and usage metering. Handlers stay thin; the stages live in
//! their own crates and this crate only wires and exposes them.

#![warn(missing_docs)]

pub mod envelope;
pub mod handlers;
pub mod middleware;
pub mod pipeline;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use praxia_auth::{AuthenticationVerifier, InMemoryUserDirectory, TokenCodec, TokenConfig};
use praxia_authz::{
    AccessDecisionEngine, InMemoryAuditSink, InMemoryEntitlementStore, InMemoryLicenseStore,
    SeatGrantService,
};
use praxia_common::cache::MokaAggregateCache;
use praxia_common::AccessResult;
use praxia_quota::{
    BillingProvider, PlanCatalog, QuotaConfigStore, QuotaTracker, UsageLedger,
};
use praxia_tenant::{
    ConnectionPool, InMemoryTenantRegistry, ResolverConfig, RouteTable, SchemaCatalog,
    TenantResolver,
};
use pipeline::RequestPipeline;
use std::net::SocketAddr;
use std::sync::Arc;

/// Gateway wiring configuration
pub struct GatewayConfig {
    /// Token signing and validation settings
    pub token: TokenConfig,
    /// Tenant resolution settings
    pub resolver: ResolverConfig,
    /// Scoped connection pool size
    pub pool_size: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            token: TokenConfig::default(),
            resolver: ResolverConfig::default(),
            pool_size: 16,
        }
    }
}

/// Billing source for deployments where reconciliation runs elsewhere
pub struct PendingBilling;

impl BillingProvider for PendingBilling {
    fn authoritative_cost(&self, _provider_request_id: &str) -> AccessResult<Option<f64>> {
        Ok(None)
    }
}

/// Application state shared across handlers
pub struct AppState {
    /// Tenant registry
    pub tenants: Arc<InMemoryTenantRegistry>,
    /// Known per-tenant namespaces
    pub schemas: Arc<SchemaCatalog>,
    /// User directory
    pub users: Arc<InMemoryUserDirectory>,
    /// License store
    pub licenses: Arc<InMemoryLicenseStore>,
    /// Entitlement store
    pub entitlements: Arc<InMemoryEntitlementStore>,
    /// Append-only decision audit
    pub audit: Arc<InMemoryAuditSink>,
    /// Per-tenant quota configuration
    pub quota_configs: Arc<QuotaConfigStore>,
    /// Usage ledger
    pub ledger: Arc<UsageLedger>,
    /// Quota tracker
    pub tracker: Arc<QuotaTracker>,
    /// Seat granting service
    pub seats: Arc<SeatGrantService>,
    /// Namespace-scoped connection pool
    pub pool: Arc<ConnectionPool>,
    /// Request admission pipeline
    pub pipeline: Arc<RequestPipeline>,
    /// Authoritative cost source for reconciliation
    pub billing: Arc<dyn BillingProvider>,
}

impl AppState {
    /// Wire the full pipeline from configuration
    pub fn new(config: GatewayConfig, billing: Arc<dyn BillingProvider>) -> Self {
        let tenants = Arc::new(InMemoryTenantRegistry::new());
        let schemas = Arc::new(SchemaCatalog::new());
        let tenant_header = config.resolver.header_name.clone();
        let resolver = Arc::new(TenantResolver::new(
            tenants.clone(),
            schemas.clone(),
            RouteTable::default(),
            config.resolver,
        ));

        let users = Arc::new(InMemoryUserDirectory::new());
        let verifier = Arc::new(AuthenticationVerifier::new(
            TokenCodec::new(config.token),
            users.clone(),
        ));

        let quota_configs = Arc::new(QuotaConfigStore::new());
        let ledger = Arc::new(UsageLedger::new());
        let tracker = Arc::new(QuotaTracker::new(
            Arc::new(PlanCatalog::new()),
            quota_configs.clone(),
            ledger.clone(),
            Arc::new(MokaAggregateCache::default()),
        ));

        let licenses = Arc::new(InMemoryLicenseStore::new());
        let entitlements = Arc::new(InMemoryEntitlementStore::new());
        let audit = Arc::new(InMemoryAuditSink::new());
        let engine = Arc::new(AccessDecisionEngine::new(
            licenses.clone(),
            entitlements.clone(),
            audit.clone(),
            tracker.clone(),
        ));
        let seats = Arc::new(SeatGrantService::new(
            engine.clone(),
            licenses.clone(),
            entitlements.clone(),
        ));

        let pool = Arc::new(ConnectionPool::new(config.pool_size));
        let pipeline = Arc::new(RequestPipeline::new(
            resolver,
            verifier,
            engine,
            tracker.clone(),
            pool.clone(),
            tenant_header,
        ));

        Self {
            tenants,
            schemas,
            users,
            licenses,
            entitlements,
            audit,
            quota_configs,
            ledger,
            tracker,
            seats,
            pool,
            pipeline,
            billing,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(GatewayConfig::default(), Arc::new(PendingBilling))
    }
}

/// Build the API router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Platform-scoped
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        // Tenant-scoped
        .route("/api/v1/session", get(handlers::session))
        .route("/api/v1/transcriptions", post(handlers::start_transcription))
        .route(
            "/api/v1/transcriptions/events",
            post(handlers::transcription_event),
        )
        .route("/api/v1/usage", get(handlers::usage_status))
        .route("/api/v1/usage/reconcile", post(handlers::reconcile_usage))
        .route("/api/v1/seats", post(handlers::grant_seat))
        .layer(axum::middleware::from_fn(middleware::logging))
        .layer(Extension(state))
}

/// Start the gateway server
pub async fn serve(addr: SocketAddr, state: Arc<AppState>) -> Result<(), std::io::Error> {
    let app = build_router(state);

    tracing::info!("Praxia gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}
