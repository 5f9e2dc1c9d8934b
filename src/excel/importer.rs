//! Spreadsheet file reader - (.xlsx/.xls/.ods) → raw cell matrix

use crate::error::{DashError, DashResult};
use crate::types::CellValue;
use calamine::{open_workbook_auto, Data, Range, Reader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Reads the first worksheet of an uploaded workbook into a row-major matrix
/// (row 0 = header), the same shape the upload endpoint hands the engine.
pub struct SheetReader {
    path: PathBuf,
}

impl SheetReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read the first worksheet. Rows that are entirely empty are skipped.
    pub fn read(&self) -> DashResult<Vec<Vec<CellValue>>> {
        let mut workbook = open_workbook_auto(&self.path).map_err(|e| {
            DashError::Import(format!(
                "Failed to open spreadsheet {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| DashError::Import("Workbook has no worksheets".to_string()))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| DashError::Import(format!("Failed to read sheet '{}': {}", sheet_name, e)))?;

        let matrix = Self::range_to_matrix(&range);
        info!(
            path = %self.path.display(),
            sheet = %sheet_name,
            rows = matrix.len(),
            "spreadsheet read"
        );
        Ok(matrix)
    }

    fn range_to_matrix(range: &Range<Data>) -> Vec<Vec<CellValue>> {
        let mut skipped = 0usize;
        let matrix: Vec<Vec<CellValue>> = range
            .rows()
            .map(|row| row.iter().map(Self::convert_cell).collect::<Vec<_>>())
            .filter(|row| {
                let blank = row.iter().all(CellValue::is_empty);
                if blank {
                    skipped += 1;
                }
                !blank
            })
            .collect();
        if skipped > 0 {
            debug!(skipped, "skipped blank rows");
        }
        matrix
    }

    /// Map one calamine cell onto the engine's tagged cell value
    fn convert_cell(cell: &Data) -> CellValue {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Text(b.to_string()),
            // Excel serial date, as the browser-side parser reports it
            Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
            other => CellValue::Text(other.to_string()),
        }
    }
}
