//! Excel report exporter - dashboard view → .xlsx

use crate::core::dashboard::Dashboard;
use crate::error::{DashError, DashResult};
use crate::types::{AxisSelection, DerivedRow, MetricsResult, StatSummary};
use chrono::Local;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::Path;

/// Writes the current metrics table and projected rows to a workbook with a
/// "Metrics" and a "Data" worksheet.
pub struct ReportExporter {
    axes: AxisSelection,
    metrics: MetricsResult,
    rows: Vec<DerivedRow>,
    /// Header columns not already shown as an axis, deduplicated
    extra_columns: Vec<String>,
}

impl ReportExporter {
    /// Snapshot the dashboard's current view.
    pub fn from_dashboard(dashboard: &Dashboard) -> DashResult<Self> {
        let sheet = dashboard.spreadsheet().ok_or(DashError::NoData)?;
        let axes = dashboard.axes().cloned().ok_or(DashError::NoData)?;

        let mut extra_columns: Vec<String> = Vec::new();
        for name in sheet.header() {
            let is_axis = *name == axes.category || axes.numeric.contains(name);
            if !is_axis && !extra_columns.contains(name) {
                extra_columns.push(name.clone());
            }
        }

        Ok(Self {
            axes,
            metrics: dashboard.metrics().clone(),
            rows: dashboard.chart().rows().to_vec(),
            extra_columns,
        })
    }

    /// Save the report to an .xlsx file
    pub fn export(&self, output_path: &Path) -> DashResult<()> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();

        let metrics_sheet = workbook.add_worksheet();
        Self::name_sheet(metrics_sheet, "Metrics")?;
        self.write_metrics(metrics_sheet, &header_format)?;

        let data_sheet = workbook.add_worksheet();
        Self::name_sheet(data_sheet, "Data")?;
        self.write_rows(data_sheet, &header_format)?;

        workbook
            .save(output_path)
            .map_err(|e| DashError::Export(format!("Failed to save Excel file: {}", e)))?;

        Ok(())
    }

    fn name_sheet(worksheet: &mut Worksheet, name: &str) -> DashResult<()> {
        worksheet
            .set_name(name)
            .map_err(|e| DashError::Export(format!("Failed to set worksheet name: {}", e)))?;
        Ok(())
    }

    /// Metric × numeric column table at full precision
    fn write_metrics(&self, worksheet: &mut Worksheet, header_format: &Format) -> DashResult<()> {
        worksheet.set_column_width(0, 22).ok();
        worksheet
            .write_string_with_format(0, 0, "Metric", header_format)
            .map_err(export_err)?;

        for (col_idx, column) in self.axes.numeric.iter().enumerate() {
            let col = (col_idx + 1) as u16;
            worksheet
                .write_string_with_format(0, col, column, header_format)
                .map_err(export_err)?;
            let stats = self.metrics.get(column).copied().unwrap_or_else(StatSummary::zero);
            for (row_idx, (_, value)) in stats.entries().iter().enumerate() {
                worksheet
                    .write_number((row_idx + 1) as u32, col, *value)
                    .map_err(export_err)?;
            }
        }

        for (row_idx, name) in StatSummary::NAMES.iter().enumerate() {
            worksheet
                .write_string((row_idx + 1) as u32, 0, *name)
                .map_err(export_err)?;
        }

        let meta_row = (StatSummary::NAMES.len() + 2) as u32;
        worksheet
            .write_string(meta_row, 0, format!("Rows: {}", self.rows.len()))
            .ok();
        worksheet
            .write_string(
                meta_row + 1,
                0,
                format!(
                    "Generated by survey-dash v{} at {}",
                    env!("CARGO_PKG_VERSION"),
                    Local::now().format("%Y-%m-%d %H:%M")
                ),
            )
            .ok();
        Ok(())
    }

    /// Category, numeric axes, then the remaining raw columns
    fn write_rows(&self, worksheet: &mut Worksheet, header_format: &Format) -> DashResult<()> {
        let mut headers: Vec<&str> = vec![self.axes.category.as_str()];
        headers.extend(self.axes.numeric.iter().map(String::as_str));
        headers.extend(self.extra_columns.iter().map(String::as_str));

        for (col_idx, name) in headers.iter().enumerate() {
            worksheet
                .write_string_with_format(0, col_idx as u16, *name, header_format)
                .map_err(export_err)?;
        }

        for (row_idx, row) in self.rows.iter().enumerate() {
            let excel_row = (row_idx + 1) as u32;
            worksheet
                .write_string(excel_row, 0, &row.category)
                .map_err(export_err)?;

            let mut col = 1u16;
            for (_, value) in &row.values {
                worksheet
                    .write_number(excel_row, col, *value)
                    .map_err(export_err)?;
                col += 1;
            }
            for name in &self.extra_columns {
                let text = row.raw(name).unwrap_or_default();
                if !text.is_empty() {
                    worksheet
                        .write_string(excel_row, col, text)
                        .map_err(export_err)?;
                }
                col += 1;
            }
        }
        Ok(())
    }
}

fn export_err(e: rust_xlsxwriter::XlsxError) -> DashError {
    DashError::Export(format!("Failed to write cell: {}", e))
}
