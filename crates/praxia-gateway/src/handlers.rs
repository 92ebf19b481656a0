//! API handlers

use crate::envelope::ApiResult;
use crate::pipeline::RequestPipeline;
use crate::AppState;
use axum::http::HeaderMap;
use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use chrono::{DateTime, Utc};
use praxia_common::{Capability, Role};
use praxia_quota::{QuotaStatus, RecordOutcome, UsageEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Application slug metered operations run under
pub const APPLICATION: &str = "scribe";

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    /// Fixed "ok" marker
    pub status: String,
    /// Crate version serving the request
    pub version: String,
}

/// Health check
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check
pub async fn ready(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    // The pool leaking a namespace scope between requests would bleed
    // one tenant's reads into another; refuse traffic instead.
    if state.pool.has_leaked_scope() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    }
}

// === Session ===

/// Current session as the pipeline sees it
#[derive(Serialize)]
pub struct SessionResponse {
    /// Whether a verified principal backs the request
    pub authenticated: bool,
    /// Verified user id, when authenticated
    pub user_id: Option<i64>,
    /// Resolved tenant slug, when the route carries tenant identity
    pub tenant: Option<String>,
}

/// Who the caller is, if anyone
///
/// Anonymous callers get a well-formed response rather than a denial.
pub async fn session(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<SessionResponse>> {
    let meta = state.pipeline.request_meta(&headers, "/api/v1/session");
    let (tenant, principal) = state
        .pipeline
        .admit_optional(&meta, authorization(&headers))?;

    Ok(Json(SessionResponse {
        authenticated: principal.is_some(),
        user_id: principal.map(|p| p.user_id),
        tenant: tenant.map(|t| t.slug),
    }))
}

// === Transcription ===

/// Body of a transcription start request
#[derive(Deserialize)]
pub struct StartTranscriptionRequest {
    /// Transcription model to run
    pub model: String,
}

/// An admitted transcription operation
#[derive(Serialize)]
pub struct StartTranscriptionResponse {
    /// Operation id the provider callback must echo
    pub operation_id: Uuid,
    /// Model the operation runs against
    pub model: String,
    /// Quota standing at admission time
    pub quota: QuotaStatus,
}

/// Begin a metered transcription
///
/// Runs the full admission pipeline, then performs the tenant-scoped
/// write on a connection pinned to the tenant's namespace.
pub async fn start_transcription(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<StartTranscriptionRequest>,
) -> ApiResult<Json<StartTranscriptionResponse>> {
    let meta = state.pipeline.request_meta(&headers, "/api/v1/transcriptions");
    let admitted = state.pipeline.admit(&meta, authorization(&headers))?;
    let tenant = RequestPipeline::require_tenant(admitted.tenant)?;

    let capability = Capability::new(APPLICATION, "note.transcribe", Role::Operations);
    let (quota, conn) = state
        .pipeline
        .begin_metered(&tenant, &admitted.principal, &capability)?;

    let operation_id = Uuid::new_v4();
    tracing::info!(
        tenant_id = tenant.id,
        user_id = admitted.principal.user_id,
        %operation_id,
        schema = conn.schema().as_str(),
        model = %req.model,
        "transcription started"
    );

    Ok(Json(StartTranscriptionResponse {
        operation_id,
        model: req.model,
        quota,
    }))
}

/// Provider callback reporting a completed operation
#[derive(Deserialize)]
pub struct TranscriptionEventRequest {
    /// Operation id issued at start
    pub operation_id: Uuid,
    /// Provider's own request id; idempotency key
    pub provider_request_id: String,
    /// Transcribed audio length
    pub audio_duration_seconds: u64,
    /// Model that produced the transcript
    pub model: String,
    /// When the usage occurred; defaults to now
    pub usage_date: Option<DateTime<Utc>>,
}

/// Outcome of a provider callback
#[derive(Serialize)]
pub struct TranscriptionEventResponse {
    /// False when the callback was a duplicate
    pub recorded: bool,
}

/// Provider completion callback
///
/// Idempotent: the provider may redeliver, and only the first delivery
/// counts against the quota.
pub async fn transcription_event(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<TranscriptionEventRequest>,
) -> ApiResult<Json<TranscriptionEventResponse>> {
    let meta = state
        .pipeline
        .request_meta(&headers, "/api/v1/transcriptions/events");
    let admitted = state.pipeline.admit(&meta, authorization(&headers))?;
    let tenant = RequestPipeline::require_tenant(admitted.tenant)?;

    let capability = Capability::new(APPLICATION, "note.record", Role::Operations);
    state
        .pipeline
        .authorize(&tenant, &admitted.principal, &capability)?;

    let outcome = state.tracker.record_usage(
        tenant.id,
        UsageEvent {
            operation_id: req.operation_id,
            provider_request_id: req.provider_request_id,
            audio_duration_seconds: req.audio_duration_seconds,
            model: req.model,
            usage_date: req.usage_date.unwrap_or_else(Utc::now),
        },
    )?;

    Ok(Json(TranscriptionEventResponse {
        recorded: outcome == RecordOutcome::Recorded,
    }))
}

// === Usage ===

/// Current-month usage for display surfaces
///
/// Served through the short-TTL cache; enforcement never reads this.
pub async fn usage_status(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<QuotaStatus>> {
    let meta = state.pipeline.request_meta(&headers, "/api/v1/usage");
    let admitted = state.pipeline.admit(&meta, authorization(&headers))?;
    let tenant = RequestPipeline::require_tenant(admitted.tenant)?;

    let status = state.pipeline.usage_status(&tenant)?;
    Ok(Json(status))
}

/// Body of a cost reconciliation request
#[derive(Deserialize)]
pub struct ReconcileRequest {
    /// Provider request id whose cost to reconcile
    pub provider_request_id: String,
}

/// Outcome of a reconciliation pass
#[derive(Serialize)]
pub struct ReconcileResponse {
    /// Whether the stored cost changed
    pub updated: bool,
}

/// Replace an estimated cost with the provider's billed amount
pub async fn reconcile_usage(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ReconcileRequest>,
) -> ApiResult<Json<ReconcileResponse>> {
    let meta = state.pipeline.request_meta(&headers, "/api/v1/usage/reconcile");
    let admitted = state.pipeline.admit(&meta, authorization(&headers))?;
    let tenant = RequestPipeline::require_tenant(admitted.tenant)?;

    let capability = Capability::new(APPLICATION, "billing.reconcile", Role::Admin);
    state
        .pipeline
        .authorize(&tenant, &admitted.principal, &capability)?;

    let updated = state.tracker.reconcile_cost(
        tenant.id,
        &req.provider_request_id,
        state.billing.as_ref(),
    )?;
    Ok(Json(ReconcileResponse { updated }))
}

// === Seats ===

/// Body of a seat grant request
#[derive(Deserialize)]
pub struct GrantSeatRequest {
    /// User receiving the seat
    pub target_user_id: i64,
    /// Role the seat carries within the application
    pub role_in_app: Role,
}

/// The entitlement written by a successful grant
#[derive(Serialize)]
pub struct GrantSeatResponse {
    /// User holding the seat
    pub user_id: i64,
    /// Application the seat belongs to
    pub application: String,
    /// Role the seat carries
    pub role_in_app: Role,
}

/// Grant a seat within the licensed application
pub async fn grant_seat(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<GrantSeatRequest>,
) -> ApiResult<Json<GrantSeatResponse>> {
    let meta = state.pipeline.request_meta(&headers, "/api/v1/seats");
    let admitted = state.pipeline.admit(&meta, authorization(&headers))?;
    let tenant = RequestPipeline::require_tenant(admitted.tenant)?;

    let entitlement = state.seats.grant_seat(
        &tenant,
        &admitted.principal,
        APPLICATION,
        req.target_user_id,
        req.role_in_app,
    )?;

    Ok(Json(GrantSeatResponse {
        user_id: entitlement.user_id,
        application: entitlement.application,
        role_in_app: entitlement.role_in_app,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_reports_ok() {
        let resp = tokio_test::block_on(health());
        assert_eq!(resp.0.status, "ok");
        assert!(!resp.0.version.is_empty());
    }
}
