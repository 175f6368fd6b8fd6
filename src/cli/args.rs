/// CLI argument definitions via clap derive.
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use url::Url;

use super::validators::{parse_delimiter, parse_end_timestamp, parse_server_url, parse_timeout};

/// promq — query a metrics server and print text or CSV.
#[derive(Debug, Parser)]
#[command(
    name = "promq",
    about = "Query a Prometheus-style metrics HTTP API and print text or CSV",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// URL of the metrics server to query.
    #[arg(
        long,
        env = "PROMQ_SERVER",
        value_name = "URL",
        value_parser = parse_server_url
    )]
    pub server: Url,

    /// Timeout for the whole request, e.g. 500ms, 30s, 1m.
    #[arg(
        long,
        global = true,
        env = "PROMQ_TIMEOUT",
        value_name = "DURATION",
        default_value = "1m",
        value_parser = parse_timeout
    )]
    pub timeout: Duration,

    /// Output format.
    #[arg(
        long,
        global = true,
        env = "PROMQ_OUTPUT",
        value_name = "FORMAT",
        default_value = "csv"
    )]
    pub output: OutputFormat,

    /// Single-character delimiter to use in CSV output.
    #[arg(
        long,
        global = true,
        env = "PROMQ_CSV_DELIMITER",
        value_name = "CHAR",
        default_value = ";",
        value_parser = parse_delimiter
    )]
    pub csv_delimiter: u8,

    /// Log to stderr; repeat for more detail (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Delimited rows, no header.
    #[default]
    Csv,
    /// One human-readable line per series.
    Text,
}

/// All subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Evaluate an expression at the current instant.
    Query(QueryArgs),
    /// Evaluate an expression over a time range.
    #[command(name = "query_range")]
    QueryRange(QueryRangeArgs),
    /// List every metric name the server knows.
    Metrics,
}

/// Arguments for `promq query`.
#[derive(Debug, Parser)]
pub struct QueryArgs {
    /// Query expression, passed to the server verbatim.
    #[arg(allow_hyphen_values = true)]
    pub expr: String,
}

/// Arguments for `promq query_range`.
#[derive(Debug, Parser)]
pub struct QueryRangeArgs {
    /// Query expression, passed to the server verbatim.
    #[arg(allow_hyphen_values = true)]
    pub expr: String,

    /// End of the range, epoch seconds.
    #[arg(value_name = "END_TIMESTAMP", value_parser = parse_end_timestamp)]
    pub end: f64,

    /// Length of the range in seconds.
    #[arg(value_name = "RANGE_SECONDS")]
    pub range: u64,

    /// Resolution in seconds (default: range / 250, at least 1).
    #[arg(value_name = "STEP_SECONDS")]
    pub step: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("promq").chain(args.iter().copied()))
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["--server", "http://localhost:9090", "query", "up"]).unwrap();
        assert_eq!(cli.timeout, Duration::from_secs(60));
        assert_eq!(cli.output, OutputFormat::Csv);
        assert_eq!(cli.csv_delimiter, b';');
        assert_eq!(cli.verbose, 0);
        match cli.command {
            Command::Query(args) => assert_eq!(args.expr, "up"),
            other => panic!("expected query, got {other:?}"),
        }
    }

    #[test]
    fn test_query_range_with_step() {
        let cli = parse(&[
            "--server",
            "http://localhost:9090",
            "--output",
            "text",
            "query_range",
            "rate(x[5m])",
            "1700000000",
            "3600",
            "60",
        ])
        .unwrap();
        assert_eq!(cli.output, OutputFormat::Text);
        match cli.command {
            Command::QueryRange(args) => {
                assert_eq!(args.expr, "rate(x[5m])");
                assert!((args.end - 1_700_000_000.0).abs() < f64::EPSILON);
                assert_eq!(args.range, 3600);
                assert_eq!(args.step, Some(60));
            }
            other => panic!("expected query_range, got {other:?}"),
        }
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let cli = parse(&[
            "--server",
            "http://localhost:9090",
            "metrics",
            "--output",
            "text",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.output, OutputFormat::Text);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_negative_expression() {
        let cli = parse(&["--server", "http://h:1", "query", "-up"]).unwrap();
        assert!(matches!(cli.command, Command::Query(QueryArgs { expr }) if expr == "-up"));
    }

    #[test]
    fn test_missing_range_is_usage_error() {
        let err = parse(&["--server", "http://h:1", "query_range", "up", "100"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_extra_query_argument_is_usage_error() {
        let err = parse(&["--server", "http://h:1", "query", "up", "down"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_bad_range_is_usage_error() {
        let err = parse(&["--server", "http://h:1", "query_range", "up", "100", "ten"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_multi_char_delimiter_is_usage_error() {
        let err = parse(&["--server", "http://h:1", "--csv-delimiter", ";;", "metrics"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }
}
