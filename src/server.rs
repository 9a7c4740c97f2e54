use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::body::Body;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::{Request, StatusCode};
use axum::middleware::{from_fn, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tracing::{error, info, warn, Instrument};

use crate::config::{ServerConfig, Thresholds};
use crate::error::InsightError;
use crate::ingest;
use crate::insights;
use crate::models::Dataset;
use crate::selector;
use crate::store::DatasetStore;

pub const UPLOAD_FIELD: &str = "file";
pub const DEFAULT_COUNT: usize = 2;

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Arc<DatasetStore>,
    pub thresholds: Arc<Thresholds>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(thresholds: Thresholds, max_upload_bytes: usize) -> Self {
        Self {
            store: Arc::new(DatasetStore::new()),
            thresholds: Arc::new(thresholds),
            max_upload_bytes,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        let config = ServerConfig::default();
        Self::new(config.thresholds, config.max_upload_bytes)
    }
}

#[derive(Debug)]
pub enum ApiError {
    Insight(InsightError),
    Multipart(MultipartError),
}

impl From<InsightError> for ApiError {
    fn from(err: InsightError) -> Self {
        ApiError::Insight(err)
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Multipart(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Insight(ref err @ InsightError::MissingColumns { ref missing }) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": err.to_string(), "missing": missing }),
            ),
            ApiError::Insight(err) if err.is_client_error() => {
                (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() }))
            }
            ApiError::Insight(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": err.to_string() }),
            ),
            ApiError::Multipart(err) => (err.status(), json!({ "error": err.body_text() })),
        };

        let message = body["error"].as_str().unwrap_or_default();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = message, "request failed");
        } else {
            warn!(status = status.as_u16(), error = message, "request rejected");
        }
        (status, Json(body)).into_response()
    }
}

/// Reads `num_customers` from the query string; absent means [`DEFAULT_COUNT`].
pub fn parse_count(params: &HashMap<String, String>) -> Result<usize, InsightError> {
    match params.get("num_customers") {
        None => Ok(DEFAULT_COUNT),
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(count) if count >= 1 => Ok(count),
            _ => Err(InsightError::InvalidCount(raw.clone())),
        },
    }
}

fn prepare(
    state: &AppState,
    params: &HashMap<String, String>,
) -> Result<(Arc<Dataset>, usize), ApiError> {
    let count = parse_count(params)?;
    let dataset = state.store.require()?;
    Ok((dataset, count))
}

async fn read_upload(multipart: &mut Multipart) -> Result<Dataset, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let bytes = field.bytes().await?;
        return Ok(ingest::load_dataset(bytes.as_ref())?);
    }
    Err(InsightError::MissingUploadField(UPLOAD_FIELD.to_string()).into())
}

pub async fn upload_csv_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let dataset = read_upload(&mut multipart).await?;
    let dataset_id = dataset.id;
    let rows = dataset.len();
    let previous = state.store.set(dataset);

    info!(
        %dataset_id,
        rows,
        replaced = previous.map(|d| d.id.to_string()).unwrap_or_default(),
        "dataset uploaded"
    );
    Ok(Json(json!({
        "message": "File uploaded successfully.",
        "dataset_id": dataset_id,
        "rows": rows,
    }))
    .into_response())
}

pub async fn least_performing_customers_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let (dataset, count) = prepare(&state, &params)?;
    let low = selector::select_low_performers(&dataset.records, count);
    Ok(Json(low).into_response())
}

pub async fn suggestions_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let (dataset, count) = prepare(&state, &params)?;
    let low = selector::select_low_performers(&dataset.records, count);
    let suggestions = insights::generate_suggestions(&dataset.records, &low, &state.thresholds);
    Ok(Json(suggestions).into_response())
}

pub async fn reasons_for_low_business_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let (dataset, count) = prepare(&state, &params)?;
    let low = selector::select_low_performers(&dataset.records, count);
    let reasons = insights::compute_reasons(&low, &state.thresholds);
    Ok(Json(reasons).into_response())
}

pub async fn healthz_handler(State(state): State<AppState>) -> Response {
    Json(json!({
        "status": "ok",
        "dataset_loaded": state.store.is_loaded(),
    }))
    .into_response()
}

pub(crate) async fn request_tracing_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().to_string();
    let route = request.uri().path().to_string();
    let span = tracing::info_span!("http.request", method = %method, route = %route);
    let started = Instant::now();

    let response = next.run(request).instrument(span.clone()).await;
    span.in_scope(|| {
        info!(
            status = response.status().as_u16(),
            latency_ms = started.elapsed().as_millis() as u64,
            "request completed"
        );
    });
    response
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/upload-csv/", post(upload_csv_handler))
        .route(
            "/least-performing-customers/",
            post(least_performing_customers_handler),
        )
        .route("/suggestions/", post(suggestions_handler))
        .route(
            "/reasons-for-low-business/",
            post(reasons_for_low_business_handler),
        )
        .layer(from_fn(request_tracing_middleware))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .with_state(state)
}

async fn wait_for_shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    config
        .thresholds
        .validate()
        .context("invalid threshold configuration")?;

    let state = AppState::new(config.thresholds.clone(), config.max_upload_bytes);
    let app = build_router(state);
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    info!(addr = %listener.local_addr()?, "sales insights service listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn count_defaults_to_two() {
        assert_eq!(parse_count(&params(&[])).unwrap(), 2);
        assert_eq!(parse_count(&params(&[("num_customers", "5")])).unwrap(), 5);
    }

    #[test]
    fn count_below_one_is_rejected() {
        for raw in ["0", "-3", "two", "1.5"] {
            assert!(matches!(
                parse_count(&params(&[("num_customers", raw)])),
                Err(InsightError::InvalidCount(_))
            ));
        }
    }

    #[test]
    fn report_without_upload_is_no_data() {
        let state = AppState::default();
        match prepare(&state, &params(&[])) {
            Err(ApiError::Insight(InsightError::NoData)) => {}
            other => panic!("expected no data, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_columns_map_to_bad_request() {
        let response = ApiError::from(InsightError::MissingColumns {
            missing: vec!["Region".to_string(), "Total".to_string()],
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Invalid CSV format. Missing required columns.");
        assert_eq!(body["missing"], json!(["Region", "Total"]));

        let response = ApiError::from(InsightError::NonFinite {
            line: 2,
            column: "Total",
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
