//! CLI command handlers

pub mod commands;

pub use commands::{chart, columns, export, open_dashboard, prompt, summarize, watch, ViewArgs};
