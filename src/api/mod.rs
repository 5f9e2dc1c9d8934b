//! Survey Dash HTTP API
//!
//! JSON endpoints around one shared dashboard session.
//! Run with `survey-server`.

pub mod handlers;
pub mod server;

pub use server::run_api_server;
