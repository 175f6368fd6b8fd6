#![deny(clippy::all, clippy::pedantic)]
//! promq — query a metrics HTTP API and print text or CSV.

use clap::Parser;

use promq::api::ClientConfig;
use promq::cli::{self, Cli, OutputCtx, write_error};
use promq::commands;

fn main() {
    let args = Cli::parse();
    cli::logging::init(args.verbose);

    let config = ClientConfig {
        server: args.server.clone(),
        timeout: args.timeout,
    };
    let ctx = OutputCtx::new(args.output, args.csv_delimiter);

    if let Err(err) = commands::dispatch(&args.command, &config, &ctx) {
        write_error(&err);
        std::process::exit(err.exit_code());
    }
}
