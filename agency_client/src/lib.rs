//! Internal modules for the Agency 360 command-line client.
//!
//! This library provides command parsing, command execution against a
//! session, and logging setup used by the agency_client binary.

pub mod app;
pub mod commands;
pub mod logging;
