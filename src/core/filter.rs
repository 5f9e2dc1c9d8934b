//! Row filtering against raw cell text.
//!
//! Predicates compose by AND. Inactive predicates are skipped, and a predicate
//! naming a column the spreadsheet lacks matches nothing rather than failing.

use crate::core::coerce;
use crate::core::spreadsheet::Spreadsheet;
use crate::types::{CellValue, FilterPredicate, FilterSpec};

/// Active predicate with its column resolved and text pre-folded.
enum Compiled {
    Contains { column: usize, needle: String },
    Range { column: usize, min: f64, max: f64 },
    OneOf { column: usize, options: Vec<String> },
    Never,
}

impl Compiled {
    fn matches(&self, row: &[CellValue]) -> bool {
        const EMPTY: &CellValue = &CellValue::Empty;
        let cell = |column: usize| row.get(column).unwrap_or(EMPTY);
        match self {
            Compiled::Contains { column, needle } => coerce::as_text(cell(*column))
                .to_lowercase()
                .contains(needle.as_str()),
            Compiled::Range { column, min, max } => coerce::parse_strict(cell(*column))
                .map(|v| v >= *min && v <= *max)
                .unwrap_or(false),
            Compiled::OneOf { column, options } => {
                let text = coerce::as_text(cell(*column)).to_lowercase();
                options.iter().any(|o| *o == text)
            }
            Compiled::Never => false,
        }
    }
}

fn compile(sheet: &Spreadsheet, filters: &FilterSpec) -> Vec<Compiled> {
    filters
        .active()
        .map(|entry| {
            let Some(column) = sheet.column_index(&entry.column) else {
                return Compiled::Never;
            };
            match &entry.predicate {
                FilterPredicate::TextContains { value } => Compiled::Contains {
                    column,
                    needle: value.to_lowercase(),
                },
                FilterPredicate::NumericRange { min, max } => Compiled::Range {
                    column,
                    min: min.unwrap_or(f64::NEG_INFINITY),
                    max: max.unwrap_or(f64::INFINITY),
                },
                FilterPredicate::OneOf { values } => Compiled::OneOf {
                    column,
                    options: values.iter().map(|v| v.to_lowercase()).collect(),
                },
            }
        })
        .collect()
}

/// Indices of the data rows that pass every active predicate, in sheet order.
pub fn apply(sheet: &Spreadsheet, filters: &FilterSpec) -> Vec<usize> {
    let all: Vec<usize> = (0..sheet.row_count()).collect();
    apply_to(sheet, &all, filters)
}

/// Narrow an existing selection of row indices. Order is preserved.
pub fn apply_to(sheet: &Spreadsheet, rows: &[usize], filters: &FilterSpec) -> Vec<usize> {
    let compiled = compile(sheet, filters);
    if compiled.is_empty() {
        return rows.to_vec();
    }
    rows.iter()
        .copied()
        .filter(|&i| {
            sheet
                .rows()
                .get(i)
                .map(|row| compiled.iter().all(|p| p.matches(row)))
                .unwrap_or(false)
        })
        .collect()
}
