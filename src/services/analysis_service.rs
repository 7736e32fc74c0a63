use std::sync::Arc;

use crate::error::AppError;
use crate::models::{AnalysisResult, StoredAnalysis};
use crate::services::analysis_store::AnalysisStore;
use crate::services::csv_analyzer::CsvAnalyzer;

/// Runs the analyzer and hands successful results to the store.
#[derive(Clone)]
pub struct AnalysisService {
    store: Arc<AnalysisStore>,
}

impl AnalysisService {
    pub fn new(store: Arc<AnalysisStore>) -> Self {
        Self { store }
    }

    /// Analyzes `raw` and persists the result alongside the raw text.
    /// Nothing is stored when analysis fails.
    pub fn ingest(&self, raw: &str) -> Result<(i64, AnalysisResult), AppError> {
        let result = CsvAnalyzer.analyze(raw)?;
        let id = self.store.save(&result, raw)?;
        tracing::info!(
            "Stored analysis {} ({} rows x {} columns)",
            id,
            result.number_of_rows,
            result.number_of_columns
        );
        Ok((id, result))
    }

    pub fn get(&self, id: i64) -> Result<StoredAnalysis, AppError> {
        self.store.find_by_id(id)?.ok_or(AppError::NotFound(id))
    }

    pub fn delete(&self, id: i64) -> Result<(), AppError> {
        if !self.store.exists(id)? {
            tracing::debug!("Delete requested for unknown analysis {}", id);
            return Err(AppError::NotFound(id));
        }
        self.store.delete(id)?;
        tracing::info!("Deleted analysis {}", id);
        Ok(())
    }
}
