use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::assoc::{AssociationBundle, AssociationRequest, DriftMetric, RiskMetric};
use crate::config::Config;
use crate::engine;
use crate::series::Window;
use crate::trend::{DriftCompare, DriftSignalBundle, DriftTimeline};
use crate::types::Bucket;

#[derive(Clone)]
struct ApiState {
    config: Config,
    events_path: PathBuf,
    audit_path: PathBuf,
}

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Clone, Default, Deserialize)]
struct WindowQuery {
    window: Option<String>,
    top: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TimelineQuery {
    window: Option<String>,
    bucket: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CorrelateQuery {
    window: Option<String>,
    bucket: Option<String>,
    x: Option<String>,
    y: Option<String>,
    lags: Option<u32>,
    subsamples: Option<u32>,
    seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/v1/drift/status", get(drift_status))
        .route("/v1/drift/timeline", get(drift_timeline))
        .route("/v1/drift/compare", get(drift_compare))
        .route("/v1/assoc/correlate", get(correlate))
        .layer(cors)
        .with_state(state)
}

pub async fn run_server(config: Config, bind: SocketAddr) -> Result<()> {
    let state = ApiState {
        events_path: config.resolved_events_path(),
        audit_path: config.resolved_audit_path(),
        config,
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("signal API listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse { status: "ok" })
}

async fn drift_status(
    State(state): State<ApiState>,
    Query(query): Query<WindowQuery>,
) -> Json<ApiResponse<DriftSignalBundle>> {
    let window = resolve_window(&state, query.window.as_deref());
    let top_n = query.top.unwrap_or(state.config.drift.top_n);
    ok(engine::drift_status(
        &state.events_path,
        Utc::now(),
        window,
        top_n,
    ))
}

async fn drift_timeline(
    State(state): State<ApiState>,
    Query(query): Query<TimelineQuery>,
) -> Json<ApiResponse<DriftTimeline>> {
    let window = resolve_window(&state, query.window.as_deref());
    let bucket = query
        .bucket
        .as_deref()
        .map(Bucket::from_label)
        .unwrap_or_default();
    ok(engine::drift_timeline(
        &state.events_path,
        Utc::now(),
        window,
        bucket,
    ))
}

async fn drift_compare(
    State(state): State<ApiState>,
    Query(query): Query<WindowQuery>,
) -> Json<ApiResponse<DriftCompare>> {
    let window = resolve_window(&state, query.window.as_deref());
    ok(engine::drift_compare(&state.events_path, Utc::now(), window))
}

async fn correlate(
    State(state): State<ApiState>,
    Query(query): Query<CorrelateQuery>,
) -> ApiResult<AssociationBundle> {
    let request = parse_correlate_query(&state, &query)?;
    let seed = query.seed.or(state.config.association.seed);
    Ok(ok(engine::association_seeded(
        &state.events_path,
        &state.audit_path,
        &request,
        Utc::now(),
        seed,
    )))
}

fn parse_correlate_query(
    state: &ApiState,
    query: &CorrelateQuery,
) -> std::result::Result<AssociationRequest, ApiError> {
    if let Some(bucket) = query.bucket.as_deref() {
        if !bucket.trim().eq_ignore_ascii_case("day") {
            return Err(ApiError::bad_request(format!(
                "unsupported bucket for association: {bucket}"
            )));
        }
    }
    let metric_x = query
        .x
        .as_deref()
        .map(DriftMetric::from_str)
        .transpose()
        .map_err(|e| ApiError::bad_request(e.to_string()))?
        .unwrap_or_default();
    let metric_y = query
        .y
        .as_deref()
        .map(RiskMetric::from_str)
        .transpose()
        .map_err(|e| ApiError::bad_request(e.to_string()))?
        .unwrap_or_default();
    Ok(AssociationRequest {
        window: resolve_window(state, query.window.as_deref()),
        metric_x,
        metric_y,
        max_lag: query.lags.or(state.config.association.max_lag),
        subsamples: query
            .subsamples
            .unwrap_or(state.config.association.subsamples),
    })
}

fn resolve_window(state: &ApiState, raw: Option<&str>) -> Window {
    raw.map(Window::from_label)
        .unwrap_or_else(|| state.config.default_window())
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}
