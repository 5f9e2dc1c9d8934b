use std::fmt;

use thiserror::Error;

pub type DashResult<T> = Result<T, DashError>;

/// Structural problems with an uploaded matrix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Invalid or empty data uploaded: a header row and at least one data row are required")]
    EmptyOrMalformed,

    #[error("At least 2 columns are required to chart data (found {found})")]
    TooFewColumns { found: usize },
}

/// One or more selected axis names are absent from the current header.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Selected axes not found in data: {}", .missing.join(", "))]
pub struct AxisResolutionError {
    pub missing: Vec<String>,
}

impl AxisResolutionError {
    pub fn new(missing: Vec<String>) -> Self {
        Self { missing }
    }
}

/// Failures on the AI query path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InsightError {
    #[error("Please enter a query")]
    EmptyQuery,

    #[error("No data available for analysis. Please upload data and apply filters.")]
    NoRows,

    #[error("Insight for snapshot {received} discarded: data changed since (now {current})")]
    Stale { received: u64, current: u64 },

    #[error("AI analysis failed: {0}")]
    Client(String),
}

#[derive(Error, Debug)]
pub enum DashError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Load(#[from] LoadError),

    #[error("{0}")]
    Axis(#[from] AxisResolutionError),

    #[error("{0}")]
    Insight(#[from] InsightError),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Export error: {0}")]
    Export(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("No spreadsheet loaded")]
    NoData,

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Pipeline ran fine but nothing survived filtering. Rendered as an explicit
/// empty state, never raised as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmptyResultWarning;

impl fmt::Display for EmptyResultWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("No valid data points for charting")
    }
}
