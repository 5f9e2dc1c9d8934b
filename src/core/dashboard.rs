//! Dashboard controller: owns the spreadsheet, filters and axes, and reruns
//! filter → projection → metrics on every mutation.
//!
//! The derived [`PipelineView`] is only ever replaced as a whole, right after a
//! mutation, so readers never see a chart computed from older inputs than the
//! metrics beside it.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::metrics;
use crate::core::projection;
use crate::core::spreadsheet::Spreadsheet;
use crate::error::{
    AxisResolutionError, DashError, DashResult, EmptyResultWarning, InsightError, LoadError,
};
use crate::insight::{InsightReply, InsightRequest};
use crate::types::{
    AxisSelection, CellValue, ChartKind, DerivedRow, FilterPredicate, FilterSpec, MetricsResult,
    SnapshotId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardState {
    NoData,
    DataLoaded,
}

/// What the chart area should show.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartState {
    NoData,
    AxesNotFound(AxisResolutionError),
    NoNumericAxis,
    Empty(EmptyResultWarning),
    Ready(Vec<DerivedRow>),
}

impl ChartState {
    /// Chart-ready rows; empty for every non-ready state.
    pub fn rows(&self) -> &[DerivedRow] {
        match self {
            ChartState::Ready(rows) => rows,
            _ => &[],
        }
    }

    pub fn status(&self) -> &'static str {
        match self {
            ChartState::NoData => "no_data",
            ChartState::AxesNotFound(_) => "axes_not_found",
            ChartState::NoNumericAxis => "no_numeric_axis",
            ChartState::Empty(_) => "empty",
            ChartState::Ready(_) => "ready",
        }
    }

    pub fn message(&self) -> String {
        match self {
            ChartState::NoData => "No valid data or axes selected".to_string(),
            ChartState::AxesNotFound(e) => e.to_string(),
            ChartState::NoNumericAxis => "Select at least one numeric axis".to_string(),
            ChartState::Empty(w) => w.to_string(),
            ChartState::Ready(rows) => format!("{} data points", rows.len()),
        }
    }
}

/// Everything derived from one (spreadsheet, filters, axes) triple.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineView {
    pub chart: ChartState,
    pub metrics: MetricsResult,
    /// Rows that passed the filters
    pub matched: usize,
    /// Rows removed by the validity check after filtering
    pub dropped: usize,
}

impl Default for PipelineView {
    fn default() -> Self {
        Self {
            chart: ChartState::NoData,
            metrics: MetricsResult::new(),
            matched: 0,
            dropped: 0,
        }
    }
}

/// Serializable chart area: what a renderer needs to draw the current view.
#[derive(Serialize, Debug)]
pub struct ChartPayload {
    pub status: String,
    pub message: String,
    pub kind: ChartKind,
    pub category_axis: Option<String>,
    /// Numeric series the selected chart kind actually draws
    pub series: Vec<String>,
    pub rows: Vec<DerivedRow>,
    pub matched: usize,
    pub dropped: usize,
}

impl ChartPayload {
    pub fn from_dashboard(dashboard: &Dashboard) -> Self {
        let view = dashboard.view();
        let kind = dashboard.chart_kind();
        let axes = dashboard.axes();
        let series = match (axes, &view.chart) {
            (Some(axes), ChartState::Ready(_)) if kind.plots_all_series() => axes.numeric.clone(),
            (Some(axes), ChartState::Ready(_)) => axes.numeric.iter().take(1).cloned().collect(),
            _ => Vec::new(),
        };
        Self {
            status: view.chart.status().to_string(),
            message: view.chart.message(),
            kind,
            category_axis: axes.map(|a| a.category.clone()),
            series,
            rows: view.chart.rows().to_vec(),
            matched: view.matched,
            dropped: view.dropped,
        }
    }
}

#[derive(Debug, Clone)]
struct Session {
    sheet: Spreadsheet,
    filters: FilterSpec,
    axes: AxisSelection,
}

impl Session {
    fn run(&self) -> PipelineView {
        match projection::project(&self.sheet, &self.filters, &self.axes) {
            Err(e) => {
                warn!(missing = ?e.missing, "axis selection does not resolve");
                PipelineView {
                    chart: ChartState::AxesNotFound(e),
                    ..PipelineView::default()
                }
            }
            Ok(p) => {
                let metrics = metrics::summarize(&p.rows, &self.axes.numeric);
                let chart = if self.axes.numeric.is_empty() {
                    ChartState::NoNumericAxis
                } else if p.is_empty() {
                    ChartState::Empty(EmptyResultWarning)
                } else {
                    ChartState::Ready(p.rows)
                };
                PipelineView {
                    chart,
                    metrics,
                    matched: p.matched,
                    dropped: p.dropped,
                }
            }
        }
    }
}

/// Single-owner UI state. All mutation goes through `&mut self`, so callers
/// sharing a dashboard must serialise access (the API server wraps it in a
/// mutex).
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    session: Option<Session>,
    chart_kind: ChartKind,
    view: PipelineView,
    snapshot: SnapshotId,
    insight: Option<String>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DashboardState {
        if self.session.is_some() {
            DashboardState::DataLoaded
        } else {
            DashboardState::NoData
        }
    }

    /// Replace everything with a freshly uploaded matrix. Filters and axes are
    /// reset. On failure the dashboard is left exactly as it was.
    pub fn load(&mut self, raw: Vec<Vec<CellValue>>) -> Result<(), LoadError> {
        let sheet = Spreadsheet::load(raw).inspect_err(|e| {
            warn!(error = %e, "upload rejected");
        })?;
        self.load_sheet(sheet)
    }

    pub fn load_sheet(&mut self, sheet: Spreadsheet) -> Result<(), LoadError> {
        let axes = AxisSelection::default_for(sheet.header()).ok_or(LoadError::TooFewColumns {
            found: sheet.column_count(),
        })?;
        let filters = FilterSpec::for_header(sheet.header());
        info!(
            category = %axes.category,
            numeric = ?axes.numeric,
            "dashboard reset for new spreadsheet"
        );
        self.session = Some(Session {
            sheet,
            filters,
            axes,
        });
        self.recompute();
        Ok(())
    }

    /// Drop the spreadsheet and return to `NoData`.
    pub fn clear(&mut self) {
        self.session = None;
        self.recompute();
    }

    pub fn spreadsheet(&self) -> Option<&Spreadsheet> {
        self.session.as_ref().map(|s| &s.sheet)
    }

    pub fn filters(&self) -> Option<&FilterSpec> {
        self.session.as_ref().map(|s| &s.filters)
    }

    pub fn axes(&self) -> Option<&AxisSelection> {
        self.session.as_ref().map(|s| &s.axes)
    }

    pub fn chart_kind(&self) -> ChartKind {
        self.chart_kind
    }

    /// Rendering style only; the projected data does not change.
    pub fn set_chart_kind(&mut self, kind: ChartKind) {
        self.chart_kind = kind;
    }

    pub fn view(&self) -> &PipelineView {
        &self.view
    }

    pub fn chart(&self) -> &ChartState {
        &self.view.chart
    }

    pub fn metrics(&self) -> &MetricsResult {
        &self.view.metrics
    }

    pub fn snapshot(&self) -> SnapshotId {
        self.snapshot
    }

    pub fn insight(&self) -> Option<&str> {
        self.insight.as_deref()
    }

    pub fn set_category_axis(&mut self, column: impl Into<String>) -> DashResult<()> {
        let column = column.into();
        self.mutate(|s| s.axes.category = column)?;
        self.axis_outcome()
    }

    pub fn set_numeric_axes(&mut self, columns: Vec<String>) -> DashResult<()> {
        self.mutate(|s| s.axes.numeric = columns)?;
        self.axis_outcome()
    }

    pub fn set_axes(&mut self, axes: AxisSelection) -> DashResult<()> {
        self.mutate(|s| s.axes = axes)?;
        self.axis_outcome()
    }

    /// Update one column's predicate. Unknown columns are rejected without
    /// touching the current state.
    pub fn set_filter(&mut self, column: &str, predicate: FilterPredicate) -> DashResult<()> {
        let session = self.session.as_ref().ok_or(DashError::NoData)?;
        if session.filters.get(column).is_none() {
            return Err(DashError::ColumnNotFound(column.to_string()));
        }
        self.mutate(|s| {
            s.filters.set(column, predicate);
        })
    }

    pub fn clear_filters(&mut self) -> DashResult<()> {
        self.mutate(|s| s.filters.clear())
    }

    /// Build the tagged payload for the external AI collaborator.
    pub fn insight_request(&self, query: &str) -> DashResult<InsightRequest> {
        let session = self.session.as_ref().ok_or(DashError::NoData)?;
        if let ChartState::AxesNotFound(e) = &self.view.chart {
            return Err(DashError::Axis(e.clone()));
        }
        let request =
            InsightRequest::build(self.snapshot, query, self.view.chart.rows(), &session.axes)?;
        Ok(request)
    }

    /// Store a collaborator reply unless the data changed since the request
    /// was built.
    pub fn accept_insight(&mut self, reply: InsightReply) -> Result<(), InsightError> {
        if reply.snapshot != self.snapshot {
            warn!(
                received = reply.snapshot.0,
                current = self.snapshot.0,
                "discarding stale insight"
            );
            return Err(InsightError::Stale {
                received: reply.snapshot.0,
                current: self.snapshot.0,
            });
        }
        self.insight = Some(reply.text);
        Ok(())
    }

    fn mutate<F>(&mut self, f: F) -> DashResult<()>
    where
        F: FnOnce(&mut Session),
    {
        let session = self.session.as_mut().ok_or(DashError::NoData)?;
        f(session);
        self.recompute();
        Ok(())
    }

    fn axis_outcome(&self) -> DashResult<()> {
        match &self.view.chart {
            ChartState::AxesNotFound(e) => Err(DashError::Axis(e.clone())),
            _ => Ok(()),
        }
    }

    fn recompute(&mut self) {
        self.snapshot = SnapshotId(self.snapshot.0 + 1);
        self.insight = None;
        self.view = match &self.session {
            Some(session) => session.run(),
            None => PipelineView::default(),
        };
        debug!(
            snapshot = self.snapshot.0,
            status = self.view.chart.status(),
            "pipeline recomputed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw() -> Vec<Vec<CellValue>> {
        vec![
            vec!["Name".into(), "Age".into(), "Region".into()],
            vec!["A".into(), "30".into(), "North".into()],
            vec!["B".into(), "x".into(), "South".into()],
            vec!["C".into(), "".into(), "north".into()],
        ]
    }

    fn loaded() -> Dashboard {
        let mut d = Dashboard::new();
        d.load(raw()).unwrap();
        d
    }

    #[test]
    fn test_starts_without_data() {
        let d = Dashboard::new();
        assert_eq!(d.state(), DashboardState::NoData);
        assert_eq!(d.chart(), &ChartState::NoData);
        assert!(d.metrics().is_empty());
    }

    #[test]
    fn test_load_sets_default_axes_and_filters() {
        let d = loaded();
        assert_eq!(d.state(), DashboardState::DataLoaded);
        let axes = d.axes().unwrap();
        assert_eq!(axes.category, "Name");
        assert_eq!(axes.numeric, vec!["Age".to_string()]);
        assert_eq!(d.filters().unwrap().len(), 3);
        assert_eq!(d.chart().rows().len(), 3);
        assert_eq!(d.metrics().get("Age").unwrap().sum, 30.0);
    }

    #[test]
    fn test_failed_load_keeps_state() {
        let mut d = Dashboard::new();
        assert_eq!(
            d.load(vec![vec!["Only".into()], vec!["x".into()]]),
            Err(LoadError::TooFewColumns { found: 1 })
        );
        assert_eq!(d.state(), DashboardState::NoData);

        let mut d = loaded();
        let before = d.snapshot();
        assert!(d.load(vec![]).is_err());
        assert_eq!(d.state(), DashboardState::DataLoaded);
        assert_eq!(d.snapshot(), before);
    }

    #[test]
    fn test_filter_recomputes_metrics() {
        let mut d = loaded();
        d.set_filter("Region", FilterPredicate::contains("NORTH"))
            .unwrap();
        assert_eq!(d.chart().rows().len(), 2);
        assert_eq!(d.metrics().get("Age").unwrap().average, 15.0);
    }

    #[test]
    fn test_filter_unknown_column() {
        let mut d = loaded();
        let before = d.snapshot();
        let err = d
            .set_filter("Ghost", FilterPredicate::contains("x"))
            .unwrap_err();
        assert!(matches!(err, DashError::ColumnNotFound(c) if c == "Ghost"));
        assert_eq!(d.snapshot(), before);
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let mut d = loaded();
        d.set_filter("Name", FilterPredicate::contains("zzz")).unwrap();
        assert_eq!(d.chart(), &ChartState::Empty(EmptyResultWarning));
        assert_eq!(d.metrics().get("Age"), Some(&crate::types::StatSummary::zero()));
    }

    #[test]
    fn test_unknown_axis_reports_and_empties_chart() {
        let mut d = loaded();
        let err = d.set_category_axis("Nope").unwrap_err();
        assert!(matches!(err, DashError::Axis(_)));
        assert_eq!(d.chart().status(), "axes_not_found");
        assert!(d.chart().rows().is_empty());
        assert!(d.metrics().is_empty());

        d.set_category_axis("Region").unwrap();
        assert_eq!(d.chart().status(), "ready");
    }

    #[test]
    fn test_no_numeric_axis_state() {
        let mut d = loaded();
        d.set_numeric_axes(vec![]).unwrap();
        assert_eq!(d.chart(), &ChartState::NoNumericAxis);
    }

    #[test]
    fn test_reload_resets_filters_and_axes() {
        let mut d = loaded();
        d.set_filter("Name", FilterPredicate::contains("a")).unwrap();
        d.set_numeric_axes(vec!["Region".to_string()]).unwrap();
        d.load(raw()).unwrap();
        assert_eq!(d.filters().unwrap().active_count(), 0);
        assert_eq!(d.axes().unwrap().numeric, vec!["Age".to_string()]);
    }

    #[test]
    fn test_every_mutation_advances_snapshot() {
        let mut d = loaded();
        let s1 = d.snapshot();
        d.clear_filters().unwrap();
        let s2 = d.snapshot();
        d.set_chart_kind(ChartKind::Pie);
        assert!(s2 > s1);
        assert_eq!(d.snapshot(), s2);
    }

    #[test]
    fn test_mutations_without_data_fail() {
        let mut d = Dashboard::new();
        assert!(matches!(d.clear_filters(), Err(DashError::NoData)));
        assert!(matches!(
            d.set_category_axis("Name"),
            Err(DashError::NoData)
        ));
    }

    #[test]
    fn test_stale_insight_is_discarded() {
        let mut d = loaded();
        let request = d.insight_request("sum of Age?").unwrap();
        d.set_filter("Name", FilterPredicate::contains("a")).unwrap();
        let err = d
            .accept_insight(InsightReply {
                snapshot: request.snapshot,
                text: "The sum of Age is 30.".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, InsightError::Stale { .. }));
        assert!(d.insight().is_none());
    }

    #[test]
    fn test_fresh_insight_is_stored_until_next_change() {
        let mut d = loaded();
        let request = d.insight_request("sum of Age?").unwrap();
        d.accept_insight(InsightReply {
            snapshot: request.snapshot,
            text: "30".to_string(),
        })
        .unwrap();
        assert_eq!(d.insight(), Some("30"));
        d.clear_filters().unwrap();
        assert!(d.insight().is_none());
    }

    #[test]
    fn test_clear_returns_to_no_data() {
        let mut d = loaded();
        d.clear();
        assert_eq!(d.state(), DashboardState::NoData);
        assert_eq!(d.chart(), &ChartState::NoData);
    }

    #[test]
    fn test_chart_payload_pie_plots_first_series_only() {
        let mut dashboard = Dashboard::new();
        dashboard
            .load(vec![
                vec!["Name".into(), "Age".into(), "Score".into()],
                vec!["A".into(), CellValue::Number(1.0), CellValue::Number(2.0)],
            ])
            .unwrap();
        dashboard
            .set_numeric_axes(vec!["Age".to_string(), "Score".to_string()])
            .unwrap();
        assert_eq!(ChartPayload::from_dashboard(&dashboard).series.len(), 2);
        dashboard.set_chart_kind(ChartKind::Pie);
        assert_eq!(
            ChartPayload::from_dashboard(&dashboard).series,
            vec!["Age".to_string()]
        );
    }
}
