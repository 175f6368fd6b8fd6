/// Blocking HTTP client for the metrics query API.
use std::time::Duration;

use tracing::debug;
use url::Url;

use super::errors::ApiError;

/// Sub-path of the instant query operation.
pub const QUERY_PATH: &str = "/api/query";
/// Sub-path of the range query operation.
pub const QUERY_RANGE_PATH: &str = "/api/query_range";
/// Sub-path of the metric name listing.
pub const METRICS_PATH: &str = "/api/metrics";

/// Connection settings, built once from parsed arguments.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the server; operation sub-paths are appended to its path.
    pub server: Url,
    /// Absolute deadline for one request, connect through body read.
    pub timeout: Duration,
}

/// One API operation together with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Endpoint<'a> {
    /// Evaluate `expr` at the current instant.
    Query {
        /// Opaque query expression.
        expr: &'a str,
    },
    /// Evaluate `expr` over `range` seconds ending at `end`, every `step` seconds.
    QueryRange {
        /// Opaque query expression.
        expr: &'a str,
        /// End of the window, epoch seconds.
        end: f64,
        /// Window length in seconds.
        range: u64,
        /// Resolution in seconds.
        step: u64,
    },
    /// List every metric name the server knows.
    Metrics,
}

impl Endpoint<'_> {
    /// Fixed sub-path for this operation.
    #[must_use]
    pub fn path(&self) -> &'static str {
        match self {
            Self::Query { .. } => QUERY_PATH,
            Self::QueryRange { .. } => QUERY_RANGE_PATH,
            Self::Metrics => METRICS_PATH,
        }
    }

    /// Query-string parameters in the order they are sent.
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Query { expr } => vec![("expr", (*expr).to_owned())],
            Self::QueryRange {
                expr,
                end,
                range,
                step,
            } => vec![
                ("expr", (*expr).to_owned()),
                ("end", format_epoch(*end)),
                ("range", range.to_string()),
                ("step", step.to_string()),
            ],
            Self::Metrics => Vec::new(),
        }
    }

    /// Build the full request URL against `base`.
    ///
    /// The sub-path is appended to whatever path `base` already has, and any
    /// query pairs already on `base` are kept ahead of the operation's own.
    #[must_use]
    pub fn url(&self, base: &Url) -> Url {
        let mut url = base.clone();
        let path = format!("{}{}", base.path().trim_end_matches('/'), self.path());
        url.set_path(&path);

        let params = self.params();
        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &params {
                pairs.append_pair(key, value);
            }
        }
        url
    }
}

/// Render an epoch as an integer when whole, otherwise as a plain float.
fn format_epoch(epoch: f64) -> String {
    // f64's Display never uses exponent notation and drops a zero fraction.
    format!("{epoch}")
}

/// Client for one server, bound to a single timeout.
pub struct Client {
    base: Url,
    timeout: Duration,
    http: reqwest::blocking::Client,
}

impl Client {
    /// Build a client from connection settings.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Transport` if the HTTP client cannot be initialised
    /// (e.g. the TLS backend fails to load).
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::blocking::Client::builder()
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|source| ApiError::Transport {
                url: config.server.to_string(),
                source,
            })?;

        Ok(Self {
            base: config.server.clone(),
            timeout: config.timeout,
            http,
        })
    }

    /// Perform a GET for `endpoint` and return the raw response body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Timeout` when the deadline passes,
    /// `ApiError::Transport` for any other network failure, and
    /// `ApiError::Status` (carrying the body) for a non-2xx answer.
    pub fn get(&self, endpoint: &Endpoint<'_>) -> Result<Vec<u8>, ApiError> {
        let url = endpoint.url(&self.base);
        debug!(%url, timeout = ?self.timeout, "sending request");

        let response = self
            .http
            .get(url.clone())
            .send()
            .map_err(|e| self.transport_error(&url, e))?;
        let status = response.status();
        let body = response
            .bytes()
            .map_err(|e| self.transport_error(&url, e))?;
        debug!(status = status.as_u16(), bytes = body.len(), "received response");

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(body.to_vec())
    }

    fn transport_error(&self, url: &Url, source: reqwest::Error) -> ApiError {
        if source.is_timeout() {
            ApiError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else {
            ApiError::Transport {
                url: url.to_string(),
                source,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_query_url() {
        let url = Endpoint::Query { expr: "up" }.url(&base("http://localhost:9090"));
        assert_eq!(url.as_str(), "http://localhost:9090/api/query?expr=up");
    }

    #[test]
    fn test_query_expression_is_encoded() {
        let url = Endpoint::Query {
            expr: r#"rate(http_requests_total{job="api"}[5m]) > 0"#,
        }
        .url(&base("http://localhost:9090"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![(
                "expr".to_owned(),
                r#"rate(http_requests_total{job="api"}[5m]) > 0"#.to_owned()
            )]
        );
        assert!(!url.as_str().contains(' '));
    }

    #[test]
    fn test_query_range_url() {
        let url = Endpoint::QueryRange {
            expr: "up",
            end: 1_700_000_000.0,
            range: 3600,
            step: 14,
        }
        .url(&base("http://localhost:9090/"));
        assert_eq!(
            url.as_str(),
            "http://localhost:9090/api/query_range?expr=up&end=1700000000&range=3600&step=14"
        );
    }

    #[test]
    fn test_fractional_end_keeps_fraction() {
        let params = Endpoint::QueryRange {
            expr: "up",
            end: 1_700_000_000.5,
            range: 60,
            step: 1,
        }
        .params();
        assert_eq!(params[1], ("end", "1700000000.5".to_owned()));
    }

    #[test]
    fn test_metrics_url_has_no_query() {
        let url = Endpoint::Metrics.url(&base("http://localhost:9090"));
        assert_eq!(url.as_str(), "http://localhost:9090/api/metrics");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_sub_path_is_appended_to_base_path() {
        let url = Endpoint::Metrics.url(&base("https://example.com/prometheus/"));
        assert_eq!(url.as_str(), "https://example.com/prometheus/api/metrics");
    }

    #[test]
    fn test_base_query_pairs_are_kept() {
        let url = Endpoint::Query { expr: "up" }.url(&base("http://host:9090/?tenant=a"));
        assert_eq!(url.as_str(), "http://host:9090/api/query?tenant=a&expr=up");
    }
}
