use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Router,
    Json,
    http::Method,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use crate::{
    AppState,
    error::AppError,
    models::RowRecord,
    services::{
        charts::{ChartData, ChartProcessor, ChartRequest},
        insights::{DataProfiler, ProfileOutcome},
    },
};
use tower_http::cors::{CorsLayer, Any};

const EMPTY_DATASET_MESSAGE: &str = "Upload data to see AI-powered insights";

pub fn routes() -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/insights/summary", post(summarize_dataset))
        .route("/insights/chart", post(prepare_chart))
        .layer(cors)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    #[serde(default)]
    file_name: Option<String>,
    rows: Vec<RowRecord>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    file_name: Option<String>,
    #[serde(flatten)]
    outcome: ProfileOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct ChartDataRequest {
    rows: Vec<RowRecord>,
    chart: ChartRequest,
}

fn check_row_limit(state: &AppState, rows: usize) -> Result<(), AppError> {
    if rows > state.config.max_rows {
        return Err(AppError::InvalidInput(format!(
            "Dataset has {} rows; at most {} are accepted",
            rows, state.config.max_rows
        )));
    }
    Ok(())
}

async fn summarize_dataset(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SummaryRequest>, JsonRejection>,
) -> Result<Json<SummaryResponse>, AppError> {
    let Json(request) = payload?;
    let start = std::time::Instant::now();
    tracing::info!(
        "Starting summary for file: {}, rows: {}",
        request.file_name.as_deref().unwrap_or("<unnamed>"),
        request.rows.len()
    );
    check_row_limit(&state, request.rows.len())?;

    let rows = request.rows;
    let outcome = tokio::task::spawn_blocking(move || DataProfiler.profile(&rows))
        .await
        .map_err(|e| AppError::Internal(format!("Profiling task failed: {}", e)))?;

    let message = match outcome {
        ProfileOutcome::Empty => Some(EMPTY_DATASET_MESSAGE),
        ProfileOutcome::Ready { .. } => None,
    };
    tracing::info!("Summary completed in {:?}", start.elapsed());

    Ok(Json(SummaryResponse {
        file_name: request.file_name,
        outcome,
        message,
    }))
}

async fn prepare_chart(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChartDataRequest>, JsonRejection>,
) -> Result<Json<ChartData>, AppError> {
    let Json(request) = payload?;
    tracing::info!(
        "Preparing {:?} chart for {} rows",
        request.chart.chart_type,
        request.rows.len()
    );
    check_row_limit(&state, request.rows.len())?;

    let chart = ChartProcessor.prepare(&request.rows, &request.chart)?;
    Ok(Json(chart))
}
