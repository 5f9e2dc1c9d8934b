use clap::{Parser, Subcommand};
use std::path::PathBuf;
use survey_dash::cli::{self, ViewArgs};
use survey_dash::error::DashResult;
use survey_dash::types::ChartKind;

#[derive(Parser)]
#[command(name = "survey-dash")]
#[command(about = "Explore survey spreadsheets: filter rows, pick axes, summarise columns.")]
#[command(long_about = "Survey Dash - survey spreadsheet explorer

Loads the first worksheet of an .xlsx/.xls/.ods file (or a JSON array of
rows), applies per-column filters, projects the rows onto one category
axis and any number of numeric axes, and reports eight statistics per
numeric axis: Sum, Average, Max, Min, Median, Standard Deviation,
Quartile 1 and Quartile 3.

COMMANDS:
  columns    - List header names and the data row count
  summarize  - Statistics table for the numeric axes
  chart      - Chart-ready rows as JSON
  export     - Report workbook (.xlsx) with metrics and rows
  prompt     - Text that would be sent to an AI analyst
  watch      - Re-summarise whenever the file changes

VIEW OPTIONS (all data commands):
  --x COLUMN                 Category axis (default: first column)
  --y COLUMN                 Numeric axis, repeatable (default: second column)
  --filter COL=TEXT          Case-insensitive substring match
  --range COL=MIN..MAX       Inclusive numeric bounds, either side optional
  --one-of COL=A|B           Any of the listed values

EXAMPLES:
  survey-dash columns responses.xlsx
  survey-dash summarize responses.xlsx --x Region --y Age --y Score
  survey-dash chart responses.xlsx --filter Region=north --kind pie -o chart.json
  survey-dash export responses.xlsx report.xlsx --range Age=18..65")]
#[command(version)]
struct Cli {
    /// Log pipeline steps to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List header names with their index and the data row count
    Columns {
        /// Spreadsheet (.xlsx, .xls, .ods) or JSON matrix
        file: PathBuf,
    },

    /// Print the statistics table for the selected numeric axes
    Summarize {
        /// Spreadsheet (.xlsx, .xls, .ods) or JSON matrix
        file: PathBuf,

        #[command(flatten)]
        view: ViewArgs,

        /// Print rounded metrics as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Emit chart-ready records as JSON
    Chart {
        /// Spreadsheet (.xlsx, .xls, .ods) or JSON matrix
        file: PathBuf,

        #[command(flatten)]
        view: ViewArgs,

        /// Chart type (bar, line, pie, donut, radar, area, scatter, radial-bar, composed)
        #[arg(short, long)]
        kind: Option<ChartKind>,

        /// Write JSON to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a report workbook with a Metrics sheet and a Data sheet
    Export {
        /// Spreadsheet (.xlsx, .xls, .ods) or JSON matrix
        file: PathBuf,

        /// Output Excel file path (.xlsx)
        output: PathBuf,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Print the AI analyst prompt for the filtered rows
    Prompt {
        /// Spreadsheet (.xlsx, .xls, .ods) or JSON matrix
        file: PathBuf,

        /// Question to ask about the data
        #[arg(short, long)]
        query: String,

        #[command(flatten)]
        view: ViewArgs,
    },

    #[command(long_about = "Watch a spreadsheet and re-summarise on changes.

Every save is treated as a fresh upload: the file is re-read, the view
options are applied again, and the statistics table is reprinted.

EXAMPLES:
  survey-dash watch responses.xlsx --y Score
  survey-dash watch responses.xlsx --filter Region=north

Press Ctrl+C to stop watching.")]
    /// Watch a file and re-summarise on every change
    Watch {
        /// Spreadsheet (.xlsx, .xls, .ods) or JSON matrix
        file: PathBuf,

        #[command(flatten)]
        view: ViewArgs,
    },
}

fn main() -> DashResult<()> {
    let cli = Cli::parse();

    let directives = if cli.verbose {
        "survey_dash=debug"
    } else {
        "survey_dash=warn"
    };
    survey_dash::telemetry::init_tracing(directives);

    match cli.command {
        Commands::Columns { file } => cli::columns(file),

        Commands::Summarize { file, view, json } => cli::summarize(file, view, json),

        Commands::Chart {
            file,
            view,
            kind,
            output,
        } => cli::chart(file, view, kind, output),

        Commands::Export { file, output, view } => cli::export(file, output, view),

        Commands::Prompt { file, query, view } => cli::prompt(file, query, view),

        Commands::Watch { file, view } => cli::watch(file, view),
    }
}
