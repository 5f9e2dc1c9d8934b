use crate::core::{ChartPayload, ChartState, Dashboard};
use crate::error::{DashError, DashResult};
use crate::excel::{ReportExporter, SheetReader};
use crate::types::{round2, AxisSelection, CellValue, ChartKind, FilterPredicate, StatSummary};
use clap::Args;
use colored::Colorize;
use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;
use tracing::debug;

/// Axis and filter options shared by every command that builds a view
#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Category (x) axis column; defaults to the first column
    #[arg(long = "x", value_name = "COLUMN")]
    pub category: Option<String>,

    /// Numeric (y) axis column, repeatable; defaults to the second column
    #[arg(long = "y", value_name = "COLUMN")]
    pub numeric: Vec<String>,

    /// Case-insensitive substring filter, e.g. --filter Region=north
    #[arg(long = "filter", value_name = "COL=TEXT")]
    pub filters: Vec<String>,

    /// Inclusive numeric bounds, e.g. --range Age=18..65 or Age=..30
    #[arg(long = "range", value_name = "COL=MIN..MAX")]
    pub ranges: Vec<String>,

    /// Match any listed value, e.g. --one-of Region=North|South
    #[arg(long = "one-of", value_name = "COL=A|B")]
    pub one_of: Vec<String>,
}

impl ViewArgs {
    /// Every filter option as (column, predicate), in the order they apply
    pub fn predicates(&self) -> DashResult<Vec<(String, FilterPredicate)>> {
        let mut out = Vec::new();
        for arg in &self.filters {
            let (column, value) = parse_assignment(arg)?;
            out.push((column, FilterPredicate::contains(value)));
        }
        for arg in &self.ranges {
            let (column, value) = parse_assignment(arg)?;
            out.push((column, parse_range(&value)?));
        }
        for arg in &self.one_of {
            let (column, value) = parse_assignment(arg)?;
            out.push((column, parse_one_of(&value)));
        }
        Ok(out)
    }

    /// Apply axes first, then filters. Any unknown column aborts.
    pub fn apply(&self, dashboard: &mut Dashboard) -> DashResult<()> {
        if self.category.is_some() || !self.numeric.is_empty() {
            let current = dashboard.axes().cloned().ok_or(DashError::NoData)?;
            dashboard.set_axes(AxisSelection {
                category: self.category.clone().unwrap_or(current.category),
                numeric: if self.numeric.is_empty() {
                    current.numeric
                } else {
                    self.numeric.clone()
                },
            })?;
        }
        for (column, predicate) in self.predicates()? {
            dashboard.set_filter(&column, predicate)?;
        }
        Ok(())
    }
}

/// Split `COL=VALUE` at the first `=`
fn parse_assignment(arg: &str) -> DashResult<(String, String)> {
    let (column, value) = arg.split_once('=').ok_or_else(|| {
        DashError::Validation(format!("Expected COLUMN=VALUE, got '{}'", arg))
    })?;
    let column = column.trim();
    if column.is_empty() {
        return Err(DashError::Validation(format!(
            "Missing column name in '{}'",
            arg
        )));
    }
    Ok((column.to_string(), value.to_string()))
}

/// `MIN..MAX` with either bound optional
fn parse_range(spec: &str) -> DashResult<FilterPredicate> {
    let (min, max) = spec.split_once("..").ok_or_else(|| {
        DashError::Validation(format!("Expected MIN..MAX, got '{}'", spec))
    })?;
    let bound = |s: &str| -> DashResult<Option<f64>> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(None);
        }
        s.parse::<f64>()
            .map(Some)
            .map_err(|_| DashError::Validation(format!("Invalid range bound '{}'", s)))
    };
    Ok(FilterPredicate::NumericRange {
        min: bound(min)?,
        max: bound(max)?,
    })
}

/// `A|B|C`; blank entries are ignored
fn parse_one_of(spec: &str) -> FilterPredicate {
    FilterPredicate::OneOf {
        values: spec
            .split('|')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

/// Format a statistic for display: 2 decimals, trailing zeros removed
fn format_number(n: f64) -> String {
    format!("{:.2}", round2(n))
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

/// Read the raw cell matrix. `.json` files hold an array of rows; anything
/// else goes through the spreadsheet reader.
pub fn read_matrix(file: &Path) -> DashResult<Vec<Vec<CellValue>>> {
    let is_json = file
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    if is_json {
        let text = fs::read_to_string(file)?;
        Ok(serde_json::from_str(&text)?)
    } else {
        SheetReader::new(file).read()
    }
}

/// Load a file into a fresh dashboard and apply the view options
pub fn open_dashboard(file: &Path, view: &ViewArgs) -> DashResult<Dashboard> {
    let raw = read_matrix(file)?;
    let mut dashboard = Dashboard::new();
    dashboard.load(raw)?;
    view.apply(&mut dashboard)?;
    debug!(
        file = %file.display(),
        status = dashboard.chart().status(),
        "dashboard opened"
    );
    Ok(dashboard)
}

/// Execute the columns command
pub fn columns(file: PathBuf) -> DashResult<()> {
    println!("{}", "📋 Survey Dash - Columns".bold().green());
    println!("   File: {}\n", file.display());

    let raw = read_matrix(&file)?;
    let mut dashboard = Dashboard::new();
    dashboard.load(raw)?;
    let sheet = dashboard.spreadsheet().ok_or(DashError::NoData)?;

    for (index, name) in sheet.header().iter().enumerate() {
        println!("   {:>3}  {}", index, name.bright_blue());
    }
    println!(
        "\n   {} columns, {} data rows",
        sheet.column_count(),
        sheet.row_count()
    );
    Ok(())
}

/// Execute the summarize command
pub fn summarize(file: PathBuf, view: ViewArgs, json: bool) -> DashResult<()> {
    let dashboard = open_dashboard(&file, &view)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&dashboard.metrics().rounded())?
        );
        return Ok(());
    }

    println!("{}", "📊 Survey Dash - Summary".bold().green());
    println!("   File: {}", file.display());
    print_view_header(&dashboard);
    println!();
    print_metrics_table(&dashboard);
    Ok(())
}

/// Execute the chart command
pub fn chart(
    file: PathBuf,
    view: ViewArgs,
    kind: Option<ChartKind>,
    output: Option<PathBuf>,
) -> DashResult<()> {
    let mut dashboard = open_dashboard(&file, &view)?;
    if let Some(kind) = kind {
        dashboard.set_chart_kind(kind);
    }

    let payload = serde_json::to_string_pretty(&ChartPayload::from_dashboard(&dashboard))?;
    match output {
        Some(path) => {
            fs::write(&path, payload)?;
            println!(
                "{} {} ({})",
                "✅ Chart data written to".bold().green(),
                path.display(),
                dashboard.chart().message()
            );
        }
        None => println!("{}", payload),
    }
    Ok(())
}

/// Execute the export command
pub fn export(file: PathBuf, output: PathBuf, view: ViewArgs) -> DashResult<()> {
    println!("{}", "📊 Survey Dash - Excel Report".bold().green());
    println!("   Input:  {}", file.display());
    println!("   Output: {}\n", output.display());

    let dashboard = open_dashboard(&file, &view)?;
    ReportExporter::from_dashboard(&dashboard)?.export(&output)?;

    println!("{}", "✅ Export Complete!".bold().green());
    println!("   {}", dashboard.chart().message());
    println!("   Excel file: {}", output.display());
    Ok(())
}

/// Execute the prompt command: print the text the AI collaborator would get
pub fn prompt(file: PathBuf, query: String, view: ViewArgs) -> DashResult<()> {
    let dashboard = open_dashboard(&file, &view)?;
    let request = dashboard.insight_request(&query)?;
    println!("{}", request.prompt()?);
    Ok(())
}

/// Execute the watch command
pub fn watch(file: PathBuf, view: ViewArgs) -> DashResult<()> {
    println!("{}", "👁️  Survey Dash - Watch Mode".bold().green());
    println!("   Watching: {}", file.display());
    println!("   Press {} to stop\n", "Ctrl+C".bold().yellow());

    if !file.exists() {
        return Err(DashError::Validation(format!(
            "File not found: {}",
            file.display()
        )));
    }

    let canonical_path = file.canonicalize()?;
    let parent_dir = canonical_path
        .parent()
        .ok_or_else(|| DashError::Validation("Cannot determine parent directory".to_string()))?;

    let (tx, rx) = channel();

    // Spreadsheet editors write in several steps; wait for the save to settle
    let mut debouncer = new_debouncer(Duration::from_millis(200), tx)
        .map_err(|e| DashError::Validation(format!("Failed to create file watcher: {}", e)))?;

    debouncer
        .watcher()
        .watch(parent_dir, RecursiveMode::NonRecursive)
        .map_err(|e| DashError::Validation(format!("Failed to watch directory: {}", e)))?;

    println!("{}", "🔄 Initial load...".cyan());
    run_watch_action(&file, &view);
    println!();

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let relevant = events.iter().any(|event| {
                    event.kind == DebouncedEventKind::Any
                        && (event.path.canonicalize().ok().as_ref() == Some(&canonical_path)
                            || event.path.file_name() == canonical_path.file_name())
                });

                if relevant {
                    println!(
                        "\n{} {}",
                        "🔄 Change detected at".cyan(),
                        chrono::Local::now().format("%H:%M:%S").to_string().cyan()
                    );
                    run_watch_action(&file, &view);
                    println!();
                }
            }
            Ok(Err(error)) => {
                eprintln!("{} Watch error: {}", "❌".red(), error);
            }
            Err(e) => {
                eprintln!("{} Channel error: {}", "❌".red(), e);
                break;
            }
        }
    }

    Ok(())
}

/// Every reload is a fresh upload: filters and axes start over from the
/// command-line options.
fn run_watch_action(file: &Path, view: &ViewArgs) {
    match open_dashboard(file, view) {
        Ok(dashboard) => {
            print_view_header(&dashboard);
            print_metrics_table(&dashboard);
        }
        Err(e) => println!("{} {}", "❌ Reload failed:".bold().red(), e),
    }
}

fn print_view_header(dashboard: &Dashboard) {
    if let Some(axes) = dashboard.axes() {
        println!("   Category: {}", axes.category.bright_blue());
        println!("   Numeric:  {}", axes.numeric.join(", ").bright_blue());
    }
    if let Some(filters) = dashboard.filters() {
        for entry in filters.active() {
            println!(
                "   Filter:   {} {}",
                entry.column.yellow(),
                describe_predicate(&entry.predicate)
            );
        }
    }
    let view = dashboard.view();
    println!(
        "   Rows:     {} matched, {} dropped",
        view.matched, view.dropped
    );
}

fn describe_predicate(predicate: &FilterPredicate) -> String {
    match predicate {
        FilterPredicate::TextContains { value } => format!("contains '{}'", value),
        FilterPredicate::NumericRange { min, max } => format!(
            "in {}..{}",
            min.map(format_number).unwrap_or_default(),
            max.map(format_number).unwrap_or_default()
        ),
        FilterPredicate::OneOf { values } => format!("one of {}", values.join(" | ")),
    }
}

/// Metric names down the side, one column per numeric axis
fn print_metrics_table(dashboard: &Dashboard) {
    match dashboard.chart() {
        ChartState::Ready(_) => {}
        ChartState::Empty(w) => println!("{}", format!("⚠️  {}", w).yellow()),
        other => {
            println!("{}", format!("⚠️  {}", other.message()).yellow());
            return;
        }
    }

    let Some(axes) = dashboard.axes() else {
        return;
    };
    let metrics = dashboard.metrics();

    let name_width = StatSummary::NAMES
        .iter()
        .map(|n| n.len())
        .max()
        .unwrap_or(0)
        .max("Metric".len());
    let cells: Vec<Vec<String>> = axes
        .numeric
        .iter()
        .map(|column| {
            let stats = metrics.get(column).copied().unwrap_or_else(StatSummary::zero);
            stats
                .entries()
                .iter()
                .map(|(_, v)| format_number(*v))
                .collect()
        })
        .collect();
    let widths: Vec<usize> = axes
        .numeric
        .iter()
        .zip(&cells)
        .map(|(column, values)| {
            values
                .iter()
                .map(String::len)
                .chain(std::iter::once(column.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut header = format!("   {:<name_width$}", "Metric");
    for (column, width) in axes.numeric.iter().zip(&widths) {
        header.push_str(&format!("  {:>width$}", column, width = width));
    }
    println!("{}", header.bold());
    println!(
        "   {}",
        "─".repeat(name_width + widths.iter().map(|w| w + 2).sum::<usize>())
    );

    for (i, name) in StatSummary::NAMES.iter().enumerate() {
        let mut line = format!("   {}", format!("{:<name_width$}", name).cyan());
        for (values, width) in cells.iter().zip(&widths) {
            line.push_str(&format!("  {:>width$}", values[i], width = width));
        }
        println!("{}", line);
    }
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
