/// `metrics` command: list metric names.
use crate::api::{Client, Endpoint};
use crate::cli::OutputCtx;
use crate::cli::output::write_metric_names;
use crate::query::{QueryError, decode_metric_names};

use super::fetch;

/// Run `promq metrics`.
///
/// # Errors
///
/// Returns `QueryError` on transport failure, a body that is not a list of
/// names, or a failed write to stdout.
pub fn run(client: &Client, ctx: &OutputCtx) -> Result<(), QueryError> {
    let body = fetch(client, &Endpoint::Metrics, ctx)?;
    let names = decode_metric_names(&body)?;
    write_metric_names(&names, ctx)?;
    Ok(())
}
