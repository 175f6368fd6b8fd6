#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! promq — query a Prometheus-style metrics HTTP API and print text or CSV.
//!
//! The binary is a thin shell over these layers:
//! - [`api`]: one blocking GET per invocation against a fixed sub-path;
//! - [`query`]: envelope decoding, label sets, and text/CSV rendering;
//! - [`cli`]: arguments, logging, and stdout/stderr output;
//! - [`commands`]: one module per subcommand.

pub mod api;
pub mod cli;
pub mod commands;
pub mod query;
