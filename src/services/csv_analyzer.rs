use std::collections::HashSet;

use chrono::Utc;
use thiserror::Error;

use crate::models::{AnalysisResult, ColumnStat};

const DELIMITER: char = ',';
const LINE_BREAKS: [char; 2] = ['\n', '\r'];
const FORBIDDEN_PHRASE: &str = "sonny hayes";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("CSV data cannot be empty")]
    EmptyInput,
    #[error("Invalid CSV format")]
    MalformedInput,
    #[error("Forbidden content detected")]
    ForbiddenContent,
    #[error("Invalid CSV structure: inconsistent number of columns (row {row} has {found}, header has {expected})")]
    InvalidStructure {
        row: usize,
        expected: usize,
        found: usize,
    },
}

pub struct CsvAnalyzer;

impl CsvAnalyzer {
    /// Validates `raw` and computes row, column, character and per-column counts.
    ///
    /// Fields are split naively on commas; quoting is not understood. Any data
    /// row whose field count differs from the header's rejects the whole input.
    pub fn analyze(&self, raw: &str) -> Result<AnalysisResult, AnalysisError> {
        let start = std::time::Instant::now();
        validate(raw)?;

        // `\r\n` yields an empty piece between the two breaks, which the blank filter drops
        let lines: Vec<&str> = raw
            .split(LINE_BREAKS)
            .filter(|line| !is_blank(line))
            .collect();
        let Some((header, data_lines)) = lines.split_first() else {
            tracing::debug!("No non-blank lines after filtering");
            return Ok(AnalysisResult::empty(Utc::now()));
        };

        let columns: Vec<&str> = header.split(DELIMITER).collect();
        let number_of_columns = columns.len();

        let rows: Vec<Vec<&str>> = data_lines
            .iter()
            .map(|line| line.split(DELIMITER).collect())
            .collect();

        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != number_of_columns)
        {
            tracing::warn!(
                "Rejecting CSV: data row {} has {} fields, header has {}",
                idx + 1,
                row.len(),
                number_of_columns
            );
            return Err(AnalysisError::InvalidStructure {
                row: idx + 1,
                expected: number_of_columns,
                found: row.len(),
            });
        }

        let column_statistics = columns
            .iter()
            .enumerate()
            .map(|(idx, name)| self.analyze_column(&rows, idx, name))
            .collect();

        let result = AnalysisResult {
            number_of_rows: rows.len(),
            number_of_columns,
            total_characters: raw.encode_utf16().count() as i64,
            column_statistics,
            created_at: Utc::now(),
        };

        tracing::info!(
            "Analyzed CSV: {} rows, {} columns, {} characters in {:?}",
            result.number_of_rows,
            result.number_of_columns,
            result.total_characters,
            start.elapsed()
        );
        Ok(result)
    }

    fn analyze_column(&self, rows: &[Vec<&str>], idx: usize, name: &str) -> ColumnStat {
        let (null_count, seen) = rows
            .iter()
            .map(|row| row.get(idx).map_or("", |cell| trim_cell(cell)))
            .fold((0, HashSet::new()), |(mut nulls, mut seen), value| {
                if value.is_empty() {
                    nulls += 1;
                } else {
                    seen.insert(value);
                }
                (nulls, seen)
            });

        ColumnStat {
            column_name: trim_cell(name).to_string(),
            null_count,
            unique_count: seen.len(),
        }
    }
}

fn validate(raw: &str) -> Result<(), AnalysisError> {
    if is_blank(raw) {
        tracing::warn!("Rejecting CSV: input is empty");
        return Err(AnalysisError::EmptyInput);
    }
    if !raw.contains(DELIMITER) {
        tracing::warn!("Rejecting CSV: no delimiter found");
        return Err(AnalysisError::MalformedInput);
    }
    if contains_forbidden_content(raw) {
        tracing::warn!("Rejecting CSV: forbidden content");
        return Err(AnalysisError::ForbiddenContent);
    }
    Ok(())
}

pub fn contains_forbidden_content(raw: &str) -> bool {
    raw.to_lowercase().contains(FORBIDDEN_PHRASE)
}

/// Strips leading and trailing spaces and control characters (anything up to
/// U+0020). Other Unicode whitespace such as NBSP is kept as cell content.
fn trim_cell(s: &str) -> &str {
    s.trim_matches(|c: char| c <= ' ')
}

fn is_blank(s: &str) -> bool {
    trim_cell(s).is_empty()
}
