use axum::{
    extract::{Multipart, Path, State},
    http::{Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    error::AppError,
    models::{AnalysisResult, ColumnStat, StoredAnalysis},
    AppState,
};

const UPLOAD_FIELD: &str = "file";

pub fn routes() -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/api/analysis/ingestCsv", post(ingest_csv))
        .route("/api/analysis/uploadCsv", post(upload_csv))
        .route(
            "/api/analysis/:id",
            get(get_analysis).delete(delete_analysis),
        )
        .layer(cors)
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ColumnStatisticsResponse {
    pub column_name: String,
    pub null_count: usize,
    pub unique_count: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DataAnalysisResponse {
    pub id: i64,
    pub number_of_rows: usize,
    pub number_of_columns: usize,
    pub total_characters: i64,
    pub column_statistics: Vec<ColumnStatisticsResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<ColumnStat> for ColumnStatisticsResponse {
    fn from(stat: ColumnStat) -> Self {
        Self {
            column_name: stat.column_name,
            null_count: stat.null_count,
            unique_count: stat.unique_count,
        }
    }
}

impl DataAnalysisResponse {
    pub fn from_result(id: i64, result: AnalysisResult) -> Self {
        Self {
            id,
            number_of_rows: result.number_of_rows,
            number_of_columns: result.number_of_columns,
            total_characters: result.total_characters,
            column_statistics: result
                .column_statistics
                .into_iter()
                .map(ColumnStatisticsResponse::from)
                .collect(),
            created_at: result.created_at,
        }
    }
}

impl From<StoredAnalysis> for DataAnalysisResponse {
    fn from(stored: StoredAnalysis) -> Self {
        Self::from_result(stored.id, stored.result)
    }
}

async fn ingest_csv(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<Json<DataAnalysisResponse>, AppError> {
    tracing::info!("Received CSV payload, {} bytes", body.len());
    let (id, result) = state.analysis.ingest(&body)?;
    Ok(Json(DataAnalysisResponse::from_result(id, result)))
}

async fn upload_csv(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<DataAnalysisResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or("<unnamed>").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(e.to_string()))?;
        tracing::info!("Received uploaded file {}, {} bytes", file_name, bytes.len());

        let raw = std::str::from_utf8(&bytes).map_err(|e| {
            tracing::warn!("Uploaded file {} is not UTF-8: {}", file_name, e);
            AppError::InvalidInput("Uploaded file is not valid UTF-8 text".to_string())
        })?;

        let (id, result) = state.analysis.ingest(raw)?;
        return Ok(Json(DataAnalysisResponse::from_result(id, result)));
    }

    Err(AppError::InvalidInput(format!(
        "Missing multipart field '{UPLOAD_FIELD}'"
    )))
}

async fn get_analysis(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<DataAnalysisResponse>, AppError> {
    let stored = state.analysis.get(id)?;
    Ok(Json(stored.into()))
}

async fn delete_analysis(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.analysis.delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}
