use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

//==============================================================================
// Cells
//==============================================================================

/// A raw spreadsheet cell as delivered by the upload parser.
///
/// Deserialises untagged, so a JSON matrix like `[["Name", 30, null]]` maps
/// straight onto `Text`, `Number` and `Empty`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl CellValue {
    /// Empty cells and zero-length text both count as missing.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(_) => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => write_number(f, *n),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Empty => Ok(()),
        }
    }
}

/// Shortest round-trip digits, switching to exponent form (`1e+21`, `1.5e-7`)
/// outside `[1e-6, 1e21)` the way browser number formatting does.
fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n == 0.0 {
        return f.write_str("0");
    }
    if n.is_infinite() {
        return f.write_str(if n > 0.0 { "Infinity" } else { "-Infinity" });
    }
    let magnitude = n.abs();
    if n.is_nan() || (1e-6..1e21).contains(&magnitude) {
        return write!(f, "{}", n);
    }
    let exp = format!("{:e}", n);
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => {
            write!(f, "{}e+{}", mantissa, power)
        }
        _ => f.write_str(&exp),
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

/// A column name resolved against a specific header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnRef {
    pub name: String,
    pub index: usize,
}

//==============================================================================
// Filters
//==============================================================================

/// Per-column row predicate. Every kind has an "empty" form that matches all
/// rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterPredicate {
    /// Case-insensitive substring match on the raw cell text
    TextContains { value: String },
    /// Inclusive bounds on cells that parse as numbers
    NumericRange { min: Option<f64>, max: Option<f64> },
    /// Case-insensitive equality against any listed value
    OneOf { values: Vec<String> },
}

impl Default for FilterPredicate {
    fn default() -> Self {
        FilterPredicate::TextContains {
            value: String::new(),
        }
    }
}

impl FilterPredicate {
    pub fn contains(value: impl Into<String>) -> Self {
        FilterPredicate::TextContains {
            value: value.into(),
        }
    }

    /// False for the no-op form of each kind.
    pub fn is_active(&self) -> bool {
        match self {
            FilterPredicate::TextContains { value } => !value.is_empty(),
            FilterPredicate::NumericRange { min, max } => min.is_some() || max.is_some(),
            FilterPredicate::OneOf { values } => !values.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterEntry {
    pub column: String,
    pub predicate: FilterPredicate,
}

/// One predicate per distinct header name, in header order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec {
    entries: Vec<FilterEntry>,
}

impl FilterSpec {
    /// Fresh spec with an empty predicate for every column.
    pub fn for_header(header: &[String]) -> Self {
        let mut entries: Vec<FilterEntry> = Vec::with_capacity(header.len());
        for name in header {
            if entries.iter().any(|e| &e.column == name) {
                continue;
            }
            entries.push(FilterEntry {
                column: name.clone(),
                predicate: FilterPredicate::default(),
            });
        }
        Self { entries }
    }

    pub fn get(&self, column: &str) -> Option<&FilterPredicate> {
        self.entries
            .iter()
            .find(|e| e.column == column)
            .map(|e| &e.predicate)
    }

    /// Replace the predicate for `column`. Returns false if the spec has no
    /// entry for that column.
    pub fn set(&mut self, column: &str, predicate: FilterPredicate) -> bool {
        match self.entries.iter_mut().find(|e| e.column == column) {
            Some(entry) => {
                entry.predicate = predicate;
                true
            }
            None => false,
        }
    }

    /// Reset every predicate to its empty form.
    pub fn clear(&mut self) {
        for entry in &mut self.entries {
            entry.predicate = FilterPredicate::default();
        }
    }

    pub fn entries(&self) -> &[FilterEntry] {
        &self.entries
    }

    pub fn active(&self) -> impl Iterator<Item = &FilterEntry> {
        self.entries.iter().filter(|e| e.predicate.is_active())
    }

    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//==============================================================================
// Axes and chart kinds
//==============================================================================

/// Categorical (X) axis plus the ordered numeric (Y) series.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AxisSelection {
    pub category: String,
    pub numeric: Vec<String>,
}

impl AxisSelection {
    pub fn new(category: impl Into<String>, numeric: Vec<String>) -> Self {
        Self {
            category: category.into(),
            numeric,
        }
    }

    /// `(header[0], [header[1]])`, or None for headers narrower than two.
    pub fn default_for(header: &[String]) -> Option<Self> {
        match header {
            [first, second, ..] => Some(Self::new(first.clone(), vec![second.clone()])),
            _ => None,
        }
    }
}

/// Chart families the renderer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Pie,
    Donut,
    Radar,
    Area,
    Scatter,
    RadialBar,
    Composed,
}

impl ChartKind {
    pub const ALL: [ChartKind; 9] = [
        ChartKind::Bar,
        ChartKind::Line,
        ChartKind::Pie,
        ChartKind::Donut,
        ChartKind::Radar,
        ChartKind::Area,
        ChartKind::Scatter,
        ChartKind::RadialBar,
        ChartKind::Composed,
    ];

    /// Pie-like charts only draw the first numeric series.
    pub fn plots_all_series(self) -> bool {
        !matches!(
            self,
            ChartKind::Pie | ChartKind::Donut | ChartKind::Radar | ChartKind::RadialBar
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Bar => "Bar Chart",
            ChartKind::Line => "Line Chart",
            ChartKind::Pie => "Pie Chart",
            ChartKind::Donut => "Donut Chart",
            ChartKind::Radar => "Radar Chart",
            ChartKind::Area => "Area Chart",
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::RadialBar => "Radial Bar Chart",
            ChartKind::Composed => "Composed Chart",
        }
    }
}

impl std::str::FromStr for ChartKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', '_', ' '], "");
        ChartKind::ALL
            .iter()
            .copied()
            .find(|kind| format!("{:?}", kind).to_lowercase() == wanted)
            .ok_or_else(|| format!("Unknown chart kind: {}", s))
    }
}

//==============================================================================
// Derived rows
//==============================================================================

/// One filtered, axis-projected row. Rebuilt on every recomputation.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRow {
    /// Categorical axis value, "Unknown" for empty source cells
    pub category: String,
    /// One coerced value per numeric axis, in selection order
    pub values: Vec<(String, f64)>,
    /// Every header column mapped to its raw cell text
    pub raw: BTreeMap<String, String>,
}

impl DerivedRow {
    pub fn value(&self, column: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| *v)
    }

    pub fn raw(&self, column: &str) -> Option<&str> {
        self.raw.get(column).map(String::as_str)
    }

    /// Flat record for chart renderers: raw columns, then the category, then
    /// numeric axes. Later keys win on name clashes.
    pub fn to_record(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut record = serde_json::Map::new();
        for (name, text) in &self.raw {
            record.insert(name.clone(), serde_json::Value::String(text.clone()));
        }
        record.insert(
            "category".to_string(),
            serde_json::Value::String(self.category.clone()),
        );
        for (name, value) in &self.values {
            let number = serde_json::Number::from_f64(*value)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null);
            record.insert(name.clone(), number);
        }
        record
    }
}

impl Serialize for DerivedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let record = self.to_record();
        let mut map = serializer.serialize_map(Some(record.len()))?;
        for (k, v) in &record {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

//==============================================================================
// Metrics
//==============================================================================

/// The fixed statistic set computed for each numeric axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StatSummary {
    #[serde(rename = "Sum")]
    pub sum: f64,
    #[serde(rename = "Average")]
    pub average: f64,
    #[serde(rename = "Max")]
    pub max: f64,
    #[serde(rename = "Min")]
    pub min: f64,
    #[serde(rename = "Median")]
    pub median: f64,
    #[serde(rename = "Standard Deviation")]
    pub std_dev: f64,
    #[serde(rename = "Quartile 1")]
    pub q1: f64,
    #[serde(rename = "Quartile 3")]
    pub q3: f64,
}

impl StatSummary {
    pub const NAMES: [&'static str; 8] = [
        "Sum",
        "Average",
        "Max",
        "Min",
        "Median",
        "Standard Deviation",
        "Quartile 1",
        "Quartile 3",
    ];

    /// All-zero summary used for columns without eligible values.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> [(&'static str, f64); 8] {
        let values = [
            self.sum,
            self.average,
            self.max,
            self.min,
            self.median,
            self.std_dev,
            self.q1,
            self.q3,
        ];
        let mut out = [("", 0.0); 8];
        for (i, value) in values.into_iter().enumerate() {
            out[i] = (Self::NAMES[i], value);
        }
        out
    }

    /// Display copy rounded to 2 decimals.
    pub fn rounded(&self) -> Self {
        Self {
            sum: round2(self.sum),
            average: round2(self.average),
            max: round2(self.max),
            min: round2(self.min),
            median: round2(self.median),
            std_dev: round2(self.std_dev),
            q1: round2(self.q1),
            q3: round2(self.q3),
        }
    }
}

/// Round to 2 decimals. Values too large to scale by 100 are already whole
/// and come back unchanged.
pub fn round2(v: f64) -> f64 {
    let scaled = v * 100.0;
    if scaled.is_finite() {
        scaled.round() / 100.0
    } else {
        v
    }
}

/// Statistics keyed by numeric column name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsResult {
    columns: BTreeMap<String, StatSummary>,
}

impl MetricsResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, stats: StatSummary) {
        self.columns.insert(column.into(), stats);
    }

    pub fn get(&self, column: &str) -> Option<&StatSummary> {
        self.columns.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &StatSummary)> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn rounded(&self) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|(k, v)| (k.clone(), v.rounded()))
                .collect(),
        }
    }
}

/// Identifies one consistent (spreadsheet, filters, axes) state. Advances on
/// every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotId(pub u64);

impl fmt::Display for SnapshotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
