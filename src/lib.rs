//! Survey Dash - survey spreadsheet explorer
//!
//! Loads an uploaded survey spreadsheet, narrows it with per-column filters,
//! projects it onto a category axis plus numeric axes, and computes
//! descriptive statistics for every numeric axis.
//!
//! # Features
//!
//! - Header-indexed spreadsheet model with total numeric coercion
//! - Case-insensitive text, numeric range and one-of filters (AND-combined)
//! - Chart-ready projected rows and eight-figure summaries per numeric axis
//! - Snapshot-tagged requests for an external AI query collaborator
//! - Excel import (.xlsx/.xls/.ods) and report export
//!
//! # Example
//!
//! ```no_run
//! use survey_dash::core::Dashboard;
//! use survey_dash::excel::SheetReader;
//!
//! let raw = SheetReader::new("responses.xlsx").read()?;
//! let mut dashboard = Dashboard::new();
//! dashboard.load(raw)?;
//!
//! for (column, stats) in dashboard.metrics().iter() {
//!     println!("{column}: average {}", stats.average);
//! }
//! # Ok::<(), survey_dash::error::DashError>(())
//! ```

pub mod api;
pub mod cli;
pub mod core;
pub mod error;
pub mod excel;
pub mod insight;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use crate::core::{ChartState, Dashboard, DashboardState, Spreadsheet};
pub use error::{DashError, DashResult};
pub use types::{AxisSelection, CellValue, ChartKind, FilterPredicate, MetricsResult, StatSummary};
