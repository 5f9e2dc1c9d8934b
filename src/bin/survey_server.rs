//! Survey Dash API Server binary
//!
//! HTTP JSON API around one dashboard session: upload a spreadsheet, change
//! filters and axes, read chart rows and statistics.

use clap::Parser;
use survey_dash::api::{run_api_server, server::ApiConfig};

#[derive(Parser, Debug)]
#[command(name = "survey-server")]
#[command(version)]
#[command(about = "Survey Dash API Server - HTTP JSON API for survey spreadsheet dashboards")]
#[command(long_about = r#"
Survey Dash API Server

Dashboard endpoints:
  - POST /api/v1/upload          - Load a raw matrix or a spreadsheet file
  - GET  /api/v1/dashboard       - Full derived state
  - POST /api/v1/axes            - Change category / numeric axes
  - POST /api/v1/filters         - Set one column's filter
  - POST /api/v1/filters/clear   - Reset all filters
  - POST /api/v1/chart-kind      - Select the chart type
  - GET  /api/v1/chart           - Chart-ready rows
  - GET  /api/v1/metrics         - Per-column statistics
  - POST /api/v1/insight/request - Build an AI query payload
  - POST /api/v1/insight/reply   - Submit the AI reply

Additional endpoints:
  - GET  /health                 - Health check
  - GET  /version                - Server version info
  - GET  /                       - API overview

Example usage:
  survey-server                           # Start on localhost:8080
  survey-server --host 0.0.0.0 --port 3000

  curl -X POST http://localhost:8080/api/v1/upload \
    -H "Content-Type: application/json" \
    -d '{"file_path": "responses.xlsx"}'
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "SURVEY_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "SURVEY_PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ApiConfig {
        host: args.host,
        port: args.port,
    };

    run_api_server(config).await
}
