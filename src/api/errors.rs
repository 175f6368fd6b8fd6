/// Errors from the HTTP transport layer.
use std::time::Duration;

use thiserror::Error;

/// Maximum number of body characters echoed back in a status error.
const BODY_SNIPPET_CHARS: usize = 200;

/// Typed errors from issuing a request against the metrics API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be built, sent, or its body read.
    #[error("request to {url} failed")]
    Transport {
        /// The full request URL.
        url: String,
        /// Underlying HTTP client error (connect refused, DNS, read failure).
        #[source]
        source: reqwest::Error,
    },

    /// The absolute request deadline passed before the body was read.
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout {
        /// The full request URL.
        url: String,
        /// The configured deadline.
        timeout: Duration,
    },

    /// The server answered with a non-2xx status.
    #[error("server returned HTTP {status}: {}", snippet(body))]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, lossily decoded as UTF-8.
        body: String,
    },
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_owned();
    }
    let mut out: String = trimmed.chars().take(BODY_SNIPPET_CHARS).collect();
    if trimmed.chars().count() > BODY_SNIPPET_CHARS {
        out.push('…');
    }
    out
}
