/// Command dispatch: routes `Command` enum variants to their implementations.
pub mod metrics;
pub mod query;
pub mod query_range;

use tracing::debug;

use crate::api::{ApiError, Client, ClientConfig, Endpoint};
use crate::cli::OutputCtx;
use crate::cli::args::Command;
use crate::query::{QueryError, server_error_message};

/// Dispatch a parsed `Command` to its handler.
///
/// # Errors
///
/// Returns `QueryError` on any command failure.
pub fn dispatch(command: &Command, config: &ClientConfig, ctx: &OutputCtx) -> Result<(), QueryError> {
    let client = Client::new(config)?;
    match command {
        Command::Query(args) => query::run(args, &client, ctx),
        Command::QueryRange(args) => query_range::run(args, &client, ctx),
        Command::Metrics => metrics::run(&client, ctx),
    }
}

/// Issue one request and return its body.
///
/// A non-2xx answer whose body is an `error` envelope is reported as the
/// server's query error rather than as a bare HTTP status.
///
/// # Errors
///
/// Returns `QueryError::Server` or `QueryError::Api`.
pub(crate) fn fetch(
    client: &Client,
    endpoint: &Endpoint<'_>,
    ctx: &OutputCtx,
) -> Result<Vec<u8>, QueryError> {
    let _t = ctx.timer("request");
    match client.get(endpoint) {
        Ok(body) => Ok(body),
        Err(ApiError::Status { status, body }) => match server_error_message(body.as_bytes()) {
            Some(message) => {
                debug!(status, "server reported a query error");
                Err(QueryError::Server { message })
            }
            None => Err(ApiError::Status { status, body }.into()),
        },
        Err(err) => Err(err.into()),
    }
}
