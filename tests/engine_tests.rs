//! Tabular engine tests: spreadsheet load, filtering, projection and metrics
//! driven end to end through the public API.

use pretty_assertions::assert_eq;
use survey_dash::core::{filter, metrics, projection, ChartState, Dashboard, Spreadsheet};
use survey_dash::error::{DashError, LoadError};
use survey_dash::types::{AxisSelection, CellValue, FilterPredicate, FilterSpec, StatSummary};

fn matrix(rows: &[&[&str]]) -> Vec<Vec<CellValue>> {
    rows.iter()
        .map(|row| row.iter().map(|c| CellValue::from(*c)).collect())
        .collect()
}

fn sheet(rows: &[&[&str]]) -> Spreadsheet {
    Spreadsheet::load(matrix(rows)).unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ═══════════════════════════════════════════════════════════════════════════
// PROJECTION TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_unfiltered_projection_keeps_every_data_row() {
    let s = sheet(&[
        &["Name", "Age", "Score"],
        &["A", "1", "2"],
        &["B", "3", "4"],
        &["C", "5", "6"],
    ]);
    let filters = FilterSpec::for_header(s.header());
    let axes = AxisSelection::default_for(s.header()).unwrap();
    let p = projection::project(&s, &filters, &axes).unwrap();
    assert_eq!(p.rows.len(), s.row_count());
    assert_eq!(p.matched, 3);
    assert_eq!(p.dropped, 0);
}

#[test]
fn test_projection_coerces_age_column() {
    let s = sheet(&[&["Name", "Age"], &["A", "30"], &["B", "x"], &["C", ""]]);
    let axes = AxisSelection::new("Name", vec!["Age".to_string()]);
    let p = projection::project(&s, &FilterSpec::default(), &axes).unwrap();
    let ages: Vec<f64> = p.rows.iter().filter_map(|r| r.value("Age")).collect();
    assert_eq!(ages, vec![30.0, 0.0, 0.0]);

    let m = metrics::summarize(&p.rows, &axes.numeric);
    let age = m.get("Age").unwrap();
    assert_eq!(age.sum, 30.0);
    assert_eq!(age.average, 10.0);
}

#[test]
fn test_projection_drops_infinite_values() {
    let s = Spreadsheet::load(vec![
        vec!["Name".into(), "Age".into()],
        vec!["A".into(), CellValue::Number(1.0)],
        vec!["B".into(), CellValue::Number(f64::INFINITY)],
        vec!["C".into(), "Infinity".into()],
        vec!["D".into(), CellValue::Number(2.0)],
    ])
    .unwrap();
    let axes = AxisSelection::new("Name", vec!["Age".to_string()]);
    let p = projection::project(&s, &FilterSpec::default(), &axes).unwrap();
    assert_eq!(p.rows.len(), 2);
    assert_eq!(p.matched, 4);
    assert_eq!(p.dropped, 2);
}

#[test]
fn test_projection_keeps_inf_words_as_zero() {
    let s = sheet(&[
        &["Name", "Age"],
        &["A", "1"],
        &["B", "inf"],
        &["C", "infinity"],
        &["D", "2"],
    ]);
    let axes = AxisSelection::new("Name", vec!["Age".to_string()]);
    let p = projection::project(&s, &FilterSpec::default(), &axes).unwrap();
    assert_eq!(p.rows.len(), 4);
    assert_eq!(p.dropped, 0);
    let ages: Vec<f64> = p.rows.iter().filter_map(|r| r.value("Age")).collect();
    assert_eq!(ages, vec![1.0, 0.0, 0.0, 2.0]);
}

#[test]
fn test_projection_missing_category_becomes_unknown() {
    let s = sheet(&[&["Name", "Age"], &["", "5"]]);
    let axes = AxisSelection::new("Name", vec!["Age".to_string()]);
    let p = projection::project(&s, &FilterSpec::default(), &axes).unwrap();
    assert_eq!(p.rows[0].category, "Unknown");
    assert_eq!(p.rows[0].raw("Name"), Some(""));
}

#[test]
fn test_projection_reports_every_missing_axis() {
    let s = sheet(&[&["Name", "Age"], &["A", "1"]]);
    let axes = AxisSelection::new("Nope", vec!["Age".to_string(), "Gone".to_string()]);
    let err = projection::project(&s, &FilterSpec::default(), &axes).unwrap_err();
    assert_eq!(err.missing, vec!["Nope".to_string(), "Gone".to_string()]);
}

#[test]
fn test_record_layout_for_renderers() {
    let s = sheet(&[&["Name", "Age", "Region"], &["A", "30", "North"]]);
    let axes = AxisSelection::new("Region", vec!["Age".to_string()]);
    let p = projection::project(&s, &FilterSpec::default(), &axes).unwrap();
    let json = serde_json::to_value(&p.rows[0]).unwrap();
    assert_eq!(json["category"], "North");
    assert_eq!(json["Age"], 30.0);
    assert_eq!(json["Name"], "A");
    assert_eq!(json["Region"], "North");
}

// ═══════════════════════════════════════════════════════════════════════════
// FILTER TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_duplicate_header_filter_and_record_agree() {
    let s = sheet(&[&["Name", "Q", "Q"], &["A", "x", "y"], &["B", "y", "x"]]);
    let mut filters = FilterSpec::for_header(s.header());
    filters.set("Q", FilterPredicate::contains("x"));
    assert_eq!(filter::apply(&s, &filters), vec![1]);

    let axes = AxisSelection::new("Name", vec![]);
    let p = projection::project(&s, &filters, &axes).unwrap();
    assert_eq!(p.rows.len(), 1);
    assert_eq!(p.rows[0].category, "B");
    assert_eq!(p.rows[0].raw("Q"), Some("x"));
    let json = serde_json::to_value(&p.rows[0]).unwrap();
    assert_eq!(json["Q"], "x");
}

#[test]
fn test_filter_is_case_insensitive_substring() {
    let s = sheet(&[&["Name", "Value"], &["A", "1"], &["B", "2"]]);
    let mut filters = FilterSpec::for_header(s.header());
    filters.set("Name", FilterPredicate::contains("a"));
    assert_eq!(filter::apply(&s, &filters), vec![0]);
}

#[test]
fn test_filter_is_idempotent() {
    let s = sheet(&[
        &["Name", "Region"],
        &["Ann", "North"],
        &["Bob", "south"],
        &["Anya", "NORTH-west"],
    ]);
    let mut filters = FilterSpec::for_header(s.header());
    filters.set("Region", FilterPredicate::contains("north"));
    let once = filter::apply(&s, &filters);
    let twice = filter::apply_to(&s, &once, &filters);
    assert_eq!(once, vec![0, 2]);
    assert_eq!(once, twice);
}

#[test]
fn test_filters_combine_with_and() {
    let s = sheet(&[
        &["Name", "Region", "Age"],
        &["Ann", "North", "30"],
        &["Bob", "North", "50"],
        &["Cid", "South", "30"],
    ]);
    let mut filters = FilterSpec::for_header(s.header());
    filters.set("Region", FilterPredicate::contains("north"));
    filters.set(
        "Age",
        FilterPredicate::NumericRange {
            min: None,
            max: Some(40.0),
        },
    );
    assert_eq!(filter::apply(&s, &filters), vec![0]);
}

#[test]
fn test_one_of_matches_whole_values() {
    let s = sheet(&[
        &["Name", "Region"],
        &["Ann", "North"],
        &["Bob", "North-East"],
        &["Cid", "south"],
    ]);
    let mut filters = FilterSpec::for_header(s.header());
    filters.set(
        "Region",
        FilterPredicate::OneOf {
            values: vec!["north".to_string(), "SOUTH".to_string()],
        },
    );
    assert_eq!(filter::apply(&s, &filters), vec![0, 2]);
}

#[test]
fn test_empty_filter_is_no_op() {
    let s = sheet(&[&["Name", "Value"], &["A", "1"], &["B", "2"]]);
    let mut filters = FilterSpec::for_header(s.header());
    filters.set("Name", FilterPredicate::contains(""));
    assert_eq!(filters.active_count(), 0);
    assert_eq!(filter::apply(&s, &filters), vec![0, 1]);
}

// ═══════════════════════════════════════════════════════════════════════════
// METRICS TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_summarize_without_rows_is_zero_filled() {
    let m = metrics::summarize(&[], &["Age".to_string()]);
    assert_eq!(m.get("Age"), Some(&StatSummary::zero()));
}

#[test]
fn test_single_value_has_zero_std_dev() {
    let stats = metrics::describe(&[42.0]);
    assert_eq!(stats.std_dev, 0.0);
    assert_eq!(stats.median, 42.0);
    assert_eq!(stats.q1, 42.0);
    assert_eq!(stats.q3, 42.0);
}

#[test]
fn test_population_std_dev_and_quartiles() {
    let stats = metrics::describe(&[4.0, 1.0, 3.0, 2.0]);
    assert!(approx(stats.std_dev, 1.25_f64.sqrt()));
    assert_eq!(stats.median, 2.5);
    assert_eq!(stats.q1, 1.75);
    assert_eq!(stats.q3, 3.25);
    assert_eq!(stats.min, 1.0);
    assert_eq!(stats.max, 4.0);
}

#[test]
fn test_metrics_rounded_for_display() {
    let m = metrics::summarize(&[], &["Age".to_string()]);
    let rounded = metrics::describe(&[1.0, 2.0, 3.0, 4.0]).rounded();
    assert_eq!(rounded.std_dev, 1.12);
    assert_eq!(m.rounded().len(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// DASHBOARD TESTS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_dashboard_unknown_axis_is_not_a_crash() {
    let mut d = Dashboard::new();
    d.load(matrix(&[&["Name", "Age"], &["A", "1"]])).unwrap();
    let err = d.set_numeric_axes(vec!["Height".to_string()]).unwrap_err();
    assert!(matches!(err, DashError::Axis(ref e) if e.missing == vec!["Height".to_string()]));
    assert!(matches!(d.chart(), ChartState::AxesNotFound(_)));
    assert!(d.chart().rows().is_empty());
}

#[test]
fn test_dashboard_upload_errors_are_distinct() {
    let mut d = Dashboard::new();
    assert_eq!(d.load(vec![]), Err(LoadError::EmptyOrMalformed));
    assert_eq!(
        d.load(matrix(&[&["Name"], &["A"]])),
        Err(LoadError::TooFewColumns { found: 1 })
    );
}

#[test]
fn test_dashboard_view_is_consistent_after_each_event() {
    let mut d = Dashboard::new();
    d.load(matrix(&[
        &["Name", "Age", "Region"],
        &["A", "10", "North"],
        &["B", "20", "South"],
        &["C", "30", "North"],
    ]))
    .unwrap();

    d.set_filter("Region", FilterPredicate::contains("north"))
        .unwrap();
    let sum: f64 = d.chart().rows().iter().filter_map(|r| r.value("Age")).sum();
    assert_eq!(d.metrics().get("Age").unwrap().sum, sum);
    assert_eq!(sum, 40.0);

    d.set_category_axis("Region").unwrap();
    assert_eq!(d.chart().rows()[0].category, "North");
    assert_eq!(d.metrics().get("Age").unwrap().sum, 40.0);
}

#[test]
fn test_dashboard_ragged_rows_are_padded() {
    let mut d = Dashboard::new();
    d.load(vec![
        vec!["Name".into(), "Age".into(), "Region".into()],
        vec!["A".into(), CellValue::Number(5.0)],
        vec![
            "B".into(),
            CellValue::Number(7.0),
            "North".into(),
            "extra".into(),
        ],
    ])
    .unwrap();
    let sheet = d.spreadsheet().unwrap();
    assert_eq!(sheet.rows()[0].len(), 3);
    assert_eq!(sheet.rows()[1].len(), 3);
    assert_eq!(d.metrics().get("Age").unwrap().sum, 12.0);
}
