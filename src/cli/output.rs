/// Output: rendering responses to stdout, errors to stderr, phase timing.
use std::error::Error as _;
use std::io::{self, Write};
use std::time::Instant;

use tracing::debug;

use super::args::OutputFormat;
use crate::query::format::{write_csv, write_names_csv, write_names_text, write_text};
use crate::query::{FormatError, QueryError, QueryResponse};

/// Output context passed to all formatters.
#[derive(Debug, Clone, Copy)]
pub struct OutputCtx {
    pub format: OutputFormat,
    /// CSV field delimiter, already validated as one ASCII byte.
    pub delimiter: u8,
}

impl OutputCtx {
    /// Construct from CLI args.
    #[must_use]
    pub fn new(format: OutputFormat, delimiter: u8) -> Self {
        Self { format, delimiter }
    }

    /// Start a named phase timer. Reports elapsed time on drop at debug level.
    #[must_use]
    pub fn timer(&self, label: &'static str) -> DebugTimer {
        DebugTimer::new(label)
    }

    /// Render a query response in the selected format.
    ///
    /// # Errors
    ///
    /// Returns `FormatError` if rendering fails.
    pub fn render_response(&self, response: &QueryResponse) -> Result<Vec<u8>, FormatError> {
        let mut buf = Vec::new();
        match self.format {
            OutputFormat::Text => write_text(response, &mut buf)?,
            OutputFormat::Csv => write_csv(response, self.delimiter, &mut buf)?,
        }
        Ok(buf)
    }

    /// Render a metric name listing in the selected format.
    ///
    /// # Errors
    ///
    /// Returns `FormatError` if rendering fails.
    pub fn render_names(&self, names: &[String]) -> Result<Vec<u8>, FormatError> {
        let mut buf = Vec::new();
        match self.format {
            OutputFormat::Text => write_names_text(names, &mut buf)?,
            OutputFormat::Csv => write_names_csv(names, self.delimiter, &mut buf)?,
        }
        Ok(buf)
    }
}

// --- Query results ---

/// Write a query response to stdout.
///
/// The whole response is rendered before anything reaches stdout, so a
/// failed rendering prints nothing.
///
/// # Errors
///
/// Returns `FormatError` if rendering or writing to stdout fails.
pub fn write_query_response(response: &QueryResponse, ctx: &OutputCtx) -> Result<(), FormatError> {
    let _t = ctx.timer("render");
    let buf = ctx.render_response(response)?;
    emit(&buf)
}

// --- Metric names ---

/// Write a metric name listing to stdout.
///
/// # Errors
///
/// Returns `FormatError` if rendering or writing to stdout fails.
pub fn write_metric_names(names: &[String], ctx: &OutputCtx) -> Result<(), FormatError> {
    let _t = ctx.timer("render");
    let buf = ctx.render_names(names)?;
    emit(&buf)
}

fn emit(buf: &[u8]) -> Result<(), FormatError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    out.write_all(buf)?;
    out.flush()?;
    Ok(())
}

// --- Error output ---

/// Write an error and its cause chain to stderr.
pub fn write_error(err: &QueryError) {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    let _ = writeln!(out, "Error: {err}");
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = writeln!(out, "  caused by: {cause}");
        source = cause.source();
    }
}

// --- Debug timer ---

/// A RAII timer that logs elapsed milliseconds on drop.
///
/// Created via [`OutputCtx::timer`]. Silent unless debug logging is enabled.
pub struct DebugTimer {
    label: &'static str,
    start: Instant,
}

impl DebugTimer {
    #[must_use]
    fn new(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }
}

impl Drop for DebugTimer {
    fn drop(&mut self) {
        let ms = self.start.elapsed().as_secs_f64() * 1000.0;
        debug!(phase = self.label, elapsed_ms = ms, "phase finished");
    }
}
