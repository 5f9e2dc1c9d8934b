//! In-memory spreadsheet snapshot: header plus rectangular data rows.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::{AxisResolutionError, LoadError};
use crate::types::{CellValue, ColumnRef};

/// An uploaded matrix after validation. Immutable once built; a new upload
/// replaces it wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct Spreadsheet {
    header: Vec<String>,
    rows: Vec<Vec<CellValue>>,
    /// Last index for each header name; later duplicates shadow earlier ones
    index: HashMap<String, usize>,
}

impl Spreadsheet {
    /// Validate a raw matrix (row 0 = header) and build the snapshot.
    ///
    /// Short rows are padded with `Empty`, long rows truncated to the header
    /// width. Blank header cells are named `col_<n>` (1-based).
    pub fn load(raw: Vec<Vec<CellValue>>) -> Result<Self, LoadError> {
        let mut rows = raw.into_iter();
        let header_row = rows.next().ok_or(LoadError::EmptyOrMalformed)?;

        if header_row.is_empty() || header_row.iter().all(CellValue::is_empty) {
            return Err(LoadError::EmptyOrMalformed);
        }

        let header: Vec<String> = header_row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                if cell.is_empty() {
                    format!("col_{}", i + 1)
                } else {
                    cell.to_string()
                }
            })
            .collect();

        let width = header.len();
        let mut padded = 0usize;
        let mut truncated = 0usize;
        let data: Vec<Vec<CellValue>> = rows
            .map(|mut row| {
                if row.len() < width {
                    padded += 1;
                    row.resize(width, CellValue::Empty);
                } else if row.len() > width {
                    truncated += 1;
                    row.truncate(width);
                }
                row
            })
            .collect();

        if data.is_empty() {
            return Err(LoadError::EmptyOrMalformed);
        }
        if width < 2 {
            return Err(LoadError::TooFewColumns { found: width });
        }

        if padded > 0 || truncated > 0 {
            debug!(padded, truncated, "normalised ragged rows");
        }

        let mut index = HashMap::with_capacity(width);
        for (i, name) in header.iter().enumerate() {
            index.insert(name.clone(), i);
        }

        info!(columns = width, rows = data.len(), "spreadsheet loaded");

        Ok(Self {
            header,
            rows: data,
            index,
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows only (the header is not included).
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    /// Last column whose header equals `name`; `None` when absent.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn resolve(&self, name: &str) -> Result<ColumnRef, AxisResolutionError> {
        self.column_index(name)
            .map(|index| ColumnRef {
                name: name.to_string(),
                index,
            })
            .ok_or_else(|| AxisResolutionError::new(vec![name.to_string()]))
    }

    /// Resolve several names at once, reporting every missing one.
    pub fn resolve_all<'a, I>(&self, names: I) -> Result<Vec<ColumnRef>, AxisResolutionError>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut found = Vec::new();
        let mut missing = Vec::new();
        for name in names {
            match self.column_index(name) {
                Some(index) => found.push(ColumnRef {
                    name: name.clone(),
                    index,
                }),
                None => missing.push(name.clone()),
            }
        }
        if missing.is_empty() {
            Ok(found)
        } else {
            Err(AxisResolutionError::new(missing))
        }
    }

    /// Out-of-range access yields `Empty` rather than panicking.
    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(EMPTY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(cells: &[&str]) -> Vec<CellValue> {
        cells.iter().map(|c| CellValue::from(*c)).collect()
    }

    #[test]
    fn test_load_rejects_header_only() {
        let err = Spreadsheet::load(vec![text_row(&["Name", "Age"])]).unwrap_err();
        assert_eq!(err, LoadError::EmptyOrMalformed);
    }

    #[test]
    fn test_load_rejects_empty_matrix() {
        assert_eq!(
            Spreadsheet::load(vec![]).unwrap_err(),
            LoadError::EmptyOrMalformed
        );
    }

    #[test]
    fn test_load_rejects_blank_header() {
        let raw = vec![vec![CellValue::Empty, CellValue::Empty], text_row(&["A", "1"])];
        assert_eq!(
            Spreadsheet::load(raw).unwrap_err(),
            LoadError::EmptyOrMalformed
        );
    }

    #[test]
    fn test_load_rejects_single_column() {
        let raw = vec![text_row(&["Name"]), text_row(&["A"])];
        assert_eq!(
            Spreadsheet::load(raw).unwrap_err(),
            LoadError::TooFewColumns { found: 1 }
        );
    }

    #[test]
    fn test_load_pads_and_truncates() {
        let raw = vec![
            text_row(&["Name", "Age", "City"]),
            text_row(&["A"]),
            text_row(&["B", "2", "X", "extra"]),
        ];
        let sheet = Spreadsheet::load(raw).unwrap();
        assert_eq!(sheet.rows()[0].len(), 3);
        assert_eq!(sheet.rows()[0][2], CellValue::Empty);
        assert_eq!(sheet.rows()[1].len(), 3);
        assert_eq!(sheet.rows()[1][2], CellValue::from("X"));
    }

    #[test]
    fn test_column_index_later_duplicate_wins() {
        let raw = vec![text_row(&["Q", "Name", "Q"]), text_row(&["1", "A", "2"])];
        let sheet = Spreadsheet::load(raw).unwrap();
        assert_eq!(sheet.column_index("Q"), Some(2));
        assert_eq!(sheet.column_index("Name"), Some(1));
        assert_eq!(sheet.column_index("Missing"), None);
    }

    #[test]
    fn test_blank_header_cells_get_placeholder_names() {
        let raw = vec![
            vec![CellValue::from("Name"), CellValue::Empty],
            text_row(&["A", "1"]),
        ];
        let sheet = Spreadsheet::load(raw).unwrap();
        assert_eq!(sheet.header(), &["Name".to_string(), "col_2".to_string()]);
    }

    #[test]
    fn test_numeric_header_cells_stringify() {
        let raw = vec![
            vec![CellValue::from("Year"), CellValue::Number(2024.0)],
            text_row(&["A", "1"]),
        ];
        let sheet = Spreadsheet::load(raw).unwrap();
        assert_eq!(sheet.column_index("2024"), Some(1));
    }

    #[test]
    fn test_resolve_all_reports_every_missing_name() {
        let sheet =
            Spreadsheet::load(vec![text_row(&["Name", "Age"]), text_row(&["A", "1"])]).unwrap();
        let names = vec!["Age".to_string(), "X".to_string(), "Y".to_string()];
        let err = sheet.resolve_all(&names).unwrap_err();
        assert_eq!(err.missing, vec!["X".to_string(), "Y".to_string()]);
        let ok = sheet.resolve_all(&names[..1]).unwrap();
        assert_eq!(ok[0].index, 1);
    }

    #[test]
    fn test_cell_out_of_range_is_empty() {
        let sheet =
            Spreadsheet::load(vec![text_row(&["Name", "Age"]), text_row(&["A", "1"])]).unwrap();
        assert_eq!(sheet.cell(0, 7), &CellValue::Empty);
        assert_eq!(sheet.cell(9, 0), &CellValue::Empty);
        assert_eq!(sheet.cell(0, 1), &CellValue::from("1"));
    }
}
