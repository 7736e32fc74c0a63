use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::{analysis_store::StoreError, csv_analyzer::AnalysisError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Analysis {0} not found")]
    NotFound(i64),
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Analysis(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
