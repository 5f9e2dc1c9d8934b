//! Axis projection: filtered rows → chart-ready [`DerivedRow`]s.

use std::collections::BTreeMap;

use tracing::debug;

use crate::core::coerce;
use crate::core::filter;
use crate::core::spreadsheet::Spreadsheet;
use crate::error::AxisResolutionError;
use crate::types::{AxisSelection, ColumnRef, DerivedRow, FilterSpec};

/// Output of one projection pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Projection {
    pub rows: Vec<DerivedRow>,
    /// Rows that passed the predicate filter
    pub matched: usize,
    /// Of those, rows dropped by the structural validity check
    pub dropped: usize,
}

impl Projection {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Resolve the axis selection against the header. Every missing name is
/// reported, category first.
pub fn resolve_axes(
    sheet: &Spreadsheet,
    axes: &AxisSelection,
) -> Result<(ColumnRef, Vec<ColumnRef>), AxisResolutionError> {
    let category = sheet.resolve(&axes.category);
    let numeric = sheet.resolve_all(&axes.numeric);
    match (category, numeric) {
        (Ok(c), Ok(n)) => Ok((c, n)),
        (c, n) => {
            let mut missing: Vec<String> = Vec::new();
            let errors = c.err().into_iter().chain(n.err());
            for name in errors.flat_map(|e| e.missing) {
                if !missing.contains(&name) {
                    missing.push(name);
                }
            }
            Err(AxisResolutionError::new(missing))
        }
    }
}

/// Filter, then project, then drop structurally invalid rows.
///
/// Predicates see raw cell text; validity checks see coerced values. A row is
/// invalid when any numeric axis value is not finite.
pub fn project(
    sheet: &Spreadsheet,
    filters: &FilterSpec,
    axes: &AxisSelection,
) -> Result<Projection, AxisResolutionError> {
    let (category, numeric) = resolve_axes(sheet, axes)?;

    let surviving = filter::apply(sheet, filters);
    let matched = surviving.len();

    let rows: Vec<DerivedRow> = surviving
        .into_iter()
        .map(|i| derive_row(sheet, i, &category, &numeric))
        .filter(|row| row.values.iter().all(|(_, v)| v.is_finite()))
        .collect();

    let dropped = matched - rows.len();
    debug!(
        total = sheet.row_count(),
        matched,
        dropped,
        kept = rows.len(),
        "projection recomputed"
    );

    Ok(Projection {
        rows,
        matched,
        dropped,
    })
}

fn derive_row(
    sheet: &Spreadsheet,
    row: usize,
    category: &ColumnRef,
    numeric: &[ColumnRef],
) -> DerivedRow {
    let values = numeric
        .iter()
        .map(|c| (c.name.clone(), coerce::as_number(sheet.cell(row, c.index))))
        .collect();

    // Later duplicates overwrite, matching `Spreadsheet::column_index`.
    let mut raw = BTreeMap::new();
    for (i, name) in sheet.header().iter().enumerate() {
        raw.insert(name.clone(), coerce::as_text(sheet.cell(row, i)));
    }

    DerivedRow {
        category: coerce::as_category(sheet.cell(row, category.index)),
        values,
        raw,
    }
}
