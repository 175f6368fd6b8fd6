/// `query_range` command: evaluate an expression over a time window.
use tracing::debug;

use crate::api::{Client, Endpoint};
use crate::cli::OutputCtx;
use crate::cli::args::QueryRangeArgs;
use crate::cli::output::write_query_response;
use crate::query::{QueryError, QueryResponse, decode_matrix_response, resolve_step};

use super::fetch;

/// Run `promq query_range`.
///
/// The step defaults to a 250th of the range and is never below one second.
///
/// # Errors
///
/// Returns `QueryError` on transport failure, a server-reported error, a
/// response that is not a matrix, or a failed write to stdout.
pub fn run(args: &QueryRangeArgs, client: &Client, ctx: &OutputCtx) -> Result<(), QueryError> {
    let step = resolve_step(args.range, args.step);
    debug!(range = args.range, step, "resolved range query step");

    let endpoint = Endpoint::QueryRange {
        expr: &args.expr,
        end: args.end,
        range: args.range,
        step,
    };
    let body = fetch(client, &endpoint, ctx)?;

    let decode_timer = ctx.timer("decode");
    let series = decode_matrix_response(&body)?;
    drop(decode_timer);

    write_query_response(&QueryResponse::Matrix(series), ctx)?;
    Ok(())
}
