/// Value parsers for command-line options.
use std::time::Duration;

use url::Url;

/// Parse a timeout such as `500ms`, `30s`, `2m`, `1h`, or bare seconds.
pub(crate) fn parse_timeout(arg: &str) -> Result<Duration, String> {
    let arg = arg.trim();
    let split = arg
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(arg.len());
    let (digits, unit) = arg.split_at(split);
    let amount: u64 = digits
        .parse()
        .map_err(|_| format!("`{arg}' isn't a valid timeout (try 30s, 1m, 500ms)"))?;

    let timeout = match unit {
        "ms" => Duration::from_millis(amount),
        "" | "s" => Duration::from_secs(amount),
        "m" => Duration::from_secs(amount.saturating_mul(60)),
        "h" => Duration::from_secs(amount.saturating_mul(3600)),
        _ => return Err(format!("unknown timeout unit `{unit}' (use ms, s, m or h)")),
    };
    if timeout.is_zero() {
        return Err("timeout must be greater than zero".to_owned());
    }
    Ok(timeout)
}

/// Parse the CSV delimiter: exactly one ASCII character, not a quote or
/// line break.
pub(crate) fn parse_delimiter(arg: &str) -> Result<u8, String> {
    let mut chars = arg.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return Err("CSV delimiter may be a single character only".to_owned());
    };
    if !c.is_ascii() {
        return Err(format!("CSV delimiter `{c}' must be an ASCII character"));
    }
    if matches!(c, '"' | '\n' | '\r') {
        return Err("CSV delimiter cannot be a quote or a line break".to_owned());
    }
    Ok(c as u8)
}

/// Parse the server base URL; it must be absolute http(s).
pub(crate) fn parse_server_url(arg: &str) -> Result<Url, String> {
    let url = Url::parse(arg).map_err(|e| format!("`{arg}' isn't a valid URL: {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!(
            "unsupported scheme `{}' (use http or https)",
            url.scheme()
        ));
    }
    if url.cannot_be_a_base() || url.host().is_none() {
        return Err(format!("`{arg}' has no host"));
    }
    Ok(url)
}

/// Parse an epoch timestamp in seconds, fractional allowed.
pub(crate) fn parse_end_timestamp(arg: &str) -> Result<f64, String> {
    arg.parse::<f64>()
        .ok()
        .filter(|t| t.is_finite())
        .ok_or_else(|| format!("Invalid end timestamp '{arg}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::millis("500ms", Duration::from_millis(500))]
    #[case::seconds("30s", Duration::from_secs(30))]
    #[case::bare("45", Duration::from_secs(45))]
    #[case::minutes("1m", Duration::from_secs(60))]
    #[case::hours("2h", Duration::from_secs(7200))]
    fn test_parse_timeout(#[case] arg: &str, #[case] want: Duration) {
        assert_eq!(parse_timeout(arg), Ok(want));
    }

    #[rstest]
    #[case::empty("")]
    #[case::zero("0s")]
    #[case::unit_only("s")]
    #[case::bad_unit("10d")]
    #[case::negative("-5s")]
    #[case::fraction("1.5s")]
    fn test_parse_timeout_rejects(#[case] arg: &str) {
        assert!(parse_timeout(arg).is_err());
    }

    #[rstest]
    #[case::semicolon(";", b';')]
    #[case::comma(",", b',')]
    #[case::tab("\t", b'\t')]
    #[case::pipe("|", b'|')]
    fn test_parse_delimiter(#[case] arg: &str, #[case] want: u8) {
        assert_eq!(parse_delimiter(arg), Ok(want));
    }

    #[rstest]
    #[case::empty("")]
    #[case::two_chars(";;")]
    #[case::word("tab")]
    #[case::non_ascii("§")]
    #[case::quote("\"")]
    #[case::newline("\n")]
    fn test_parse_delimiter_rejects(#[case] arg: &str) {
        assert!(parse_delimiter(arg).is_err());
    }

    #[test]
    fn test_parse_delimiter_multi_char_message() {
        assert_eq!(
            parse_delimiter(";;").unwrap_err(),
            "CSV delimiter may be a single character only"
        );
    }

    #[rstest]
    #[case::plain("http://localhost:9090")]
    #[case::tls_with_path("https://metrics.example.com/prometheus/")]
    fn test_parse_server_url(#[case] arg: &str) {
        assert!(parse_server_url(arg).is_ok());
    }

    #[rstest]
    #[case::no_scheme("localhost:9090")]
    #[case::ftp("ftp://example.com")]
    #[case::garbage("not a url")]
    #[case::mailto("mailto:ops@example.com")]
    fn test_parse_server_url_rejects(#[case] arg: &str) {
        assert!(parse_server_url(arg).is_err());
    }

    #[test]
    fn test_parse_end_timestamp() {
        assert_eq!(parse_end_timestamp("1700000000"), Ok(1_700_000_000.0));
        assert_eq!(parse_end_timestamp("1700000000.25"), Ok(1_700_000_000.25));
        assert!(parse_end_timestamp("now").is_err());
        assert!(parse_end_timestamp("inf").is_err());
        assert!(parse_end_timestamp("NaN").is_err());
    }
}
