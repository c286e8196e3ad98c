//! HTTP route definitions and handlers.

use axum::{
    async_trait,
    extract::{FromRequest, Query, Request, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use domain_avail_lib::{validate_event, BatchReport, CheckResult, DomainCheckError, UsageEvent};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{error_codes, ApiError};
use crate::state::AppState;

/// JSON extractor that answers malformed bodies with a 400 `ApiError`
/// instead of axum's plain-text 415/422 rejections.
pub struct JsonBadRequest<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBadRequest<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBadRequest(value)),
            Err(rejection) => Err(ApiError::invalid_input(rejection.body_text())),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    pub domain: Option<String>,
}

/// Creates the HTTP router with every route bound to `state`.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/check", get(check_query).post(check_body))
        .route("/check/batch", post(check_batch))
        .route("/usage", post(record_usage))
        .route("/providers", get(list_providers))
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": domain_avail_lib::VERSION,
    }))
}

async fn check_query(
    State(state): State<AppState>,
    Query(query): Query<CheckQuery>,
) -> Result<Json<CheckResult>, ApiError> {
    check_single(&state, query.domain).await
}

async fn check_body(
    State(state): State<AppState>,
    JsonBadRequest(body): JsonBadRequest<CheckQuery>,
) -> Result<Json<CheckResult>, ApiError> {
    check_single(&state, body.domain).await
}

async fn check_single(
    state: &AppState,
    domain: Option<String>,
) -> Result<Json<CheckResult>, ApiError> {
    let domain = domain
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| ApiError::invalid_input("domain is required"))?;

    let result = tokio::time::timeout(state.request_timeout, state.checker.check_domain(&domain))
        .await
        .map_err(|_| {
            warn!(domain = %domain, "check exceeded request timeout");
            ApiError::timeout(format!(
                "check did not finish within {:?}",
                state.request_timeout
            ))
        })??;

    info!(domain = %result.domain, available = result.available, method = %result.method, "check");
    Ok(Json(result))
}

async fn check_batch(
    State(state): State<AppState>,
    JsonBadRequest(body): JsonBadRequest<serde_json::Value>,
) -> Result<Json<BatchReport>, ApiError> {
    let domains = body.get("domains").cloned().unwrap_or(serde_json::Value::Null);

    let report = tokio::time::timeout(
        state.request_timeout,
        state.checker.check_batch_value(&domains),
    )
    .await
    .map_err(|_| {
        warn!("batch exceeded request timeout");
        ApiError::timeout(format!(
            "batch did not finish within {:?}",
            state.request_timeout
        ))
    })??;

    Ok(Json(report))
}

async fn record_usage(
    State(state): State<AppState>,
    JsonBadRequest(event): JsonBadRequest<UsageEvent>,
) -> Result<impl IntoResponse, ApiError> {
    let sink = state
        .usage
        .as_ref()
        .ok_or_else(|| ApiError::unavailable("usage recording is not configured"))?;

    validate_event(&event)?;

    match sink.record(&event).await {
        Ok(id) => Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id })))),
        Err(err @ DomainCheckError::InvalidInput { .. }) => Err(err.into()),
        Err(err) => {
            warn!(error = %err, "usage sink failed");
            Err(ApiError::new(error_codes::UPSTREAM_ERROR, err.to_string()))
        }
    }
}

async fn list_providers(State(state): State<AppState>) -> impl IntoResponse {
    let checker = &state.checker;
    Json(serde_json::json!({
        "fallbackOrder": checker.fallback_order(),
        "batchProvider": checker.batch_provider(),
        "maxBatch": checker.max_batch(),
        "rateLimits": checker.rate_limits().await,
    }))
}
