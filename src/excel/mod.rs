//! Excel boundary
//!
//! - Import: first worksheet of an uploaded workbook → raw cell matrix
//! - Export: current dashboard metrics and rows → report workbook

mod exporter;
mod importer;

pub use exporter::ReportExporter;
pub use importer::SheetReader;
