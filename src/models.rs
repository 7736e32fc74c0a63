use chrono::{DateTime, Utc};

/// Outcome of analysing one CSV payload.
///
/// Owns its column statistics in header order; nothing mutates it after
/// construction.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub number_of_rows: usize,
    pub number_of_columns: usize,
    pub total_characters: i64,
    pub column_statistics: Vec<ColumnStat>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnStat {
    pub column_name: String,
    pub null_count: usize,
    pub unique_count: usize,
}

impl AnalysisResult {
    /// Result for input that contained no non-blank lines.
    pub fn empty(created_at: DateTime<Utc>) -> Self {
        Self {
            number_of_rows: 0,
            number_of_columns: 0,
            total_characters: 0,
            column_statistics: Vec::new(),
            created_at,
        }
    }
}

/// A persisted analysis together with the identity and raw text it was stored with.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredAnalysis {
    pub id: i64,
    pub result: AnalysisResult,
    pub original_data: String,
}
