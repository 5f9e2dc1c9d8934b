//! Tabular data engine: spreadsheet model, coercion, filtering, projection,
//! metrics, and the dashboard controller that drives them

pub mod coerce;
pub mod dashboard;
pub mod filter;
pub mod metrics;
pub mod projection;
pub mod spreadsheet;

pub use dashboard::{ChartPayload, ChartState, Dashboard, DashboardState, PipelineView};
pub use projection::Projection;
pub use spreadsheet::Spreadsheet;
