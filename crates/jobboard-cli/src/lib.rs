//! `JobBoard` CLI Library
//!
//! Subcommand handlers and output formatting for the `jobboard` binary.

pub mod applications_cmd;
pub mod auth_cmd;
pub mod config;
pub mod fmt;
pub mod jobs_cmd;
pub mod profile_cmd;
pub mod saved_cmd;
pub mod upload;
