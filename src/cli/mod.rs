//! CLI command handlers

pub mod commands;

pub use commands::{check, export, init, open_session, preview, print_report, sheets, watch, SessionArgs};
