/// `query` command: evaluate an expression at one instant.
use crate::api::{Client, Endpoint};
use crate::cli::OutputCtx;
use crate::cli::args::QueryArgs;
use crate::cli::output::write_query_response;
use crate::query::{QueryError, decode_query_response};

use super::fetch;

/// Run `promq query`.
///
/// # Errors
///
/// Returns `QueryError` on transport failure, a server-reported error, an
/// undecodable response, or a failed write to stdout.
pub fn run(args: &QueryArgs, client: &Client, ctx: &OutputCtx) -> Result<(), QueryError> {
    let body = fetch(client, &Endpoint::Query { expr: &args.expr }, ctx)?;

    let decode_timer = ctx.timer("decode");
    let response = decode_query_response(&body)?;
    drop(decode_timer);

    write_query_response(&response, ctx)?;
    Ok(())
}
