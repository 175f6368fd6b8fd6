/// Errors from the query domain layer.
use serde_json::Value;
use thiserror::Error;

use crate::api::ApiError;

/// Maximum number of characters of raw JSON quoted in a decode error.
const FRAGMENT_CHARS: usize = 80;

/// A response payload that does not match the shape its type tag promises.
#[derive(Debug, Error)]
#[error("cannot decode `{path}`: {reason} (got {fragment})")]
pub struct DecodeError {
    /// JSON path of the offending field, e.g. `value[0].timestamp`.
    pub path: String,
    /// What was expected there.
    pub reason: String,
    /// Compact, truncated rendering of the raw JSON found there.
    pub fragment: String,
}

impl DecodeError {
    /// Error at `path` quoting the raw JSON value found there.
    #[must_use]
    pub fn new(path: impl Into<String>, reason: impl Into<String>, raw: &Value) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
            fragment: truncate(&raw.to_string()),
        }
    }

    /// Error for a required field that is absent from the object at `path`.
    #[must_use]
    pub fn missing(path: impl Into<String>, field: &str, object: &Value) -> Self {
        Self::new(path, format!("missing required field `{field}`"), object)
    }

    /// Error for a body that is not JSON at all.
    #[must_use]
    pub fn invalid_json(err: &serde_json::Error, body: &[u8]) -> Self {
        Self {
            path: "<body>".to_owned(),
            reason: err.to_string(),
            fragment: truncate(&String::from_utf8_lossy(body)),
        }
    }
}

fn truncate(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "<empty>".to_owned();
    }
    let mut out: String = trimmed.chars().take(FRAGMENT_CHARS).collect();
    if trimmed.chars().count() > FRAGMENT_CHARS {
        out.push('…');
    }
    out
}

/// Failure while rendering a response to the output stream.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Writing to the output failed.
    #[error("cannot write output: {0}")]
    Io(#[from] std::io::Error),

    /// The CSV writer rejected a record.
    #[error("cannot write CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// A label set string that does not follow the `name{key="value", ...}` form.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid label set at offset {offset}: {reason}")]
pub struct LabelParseError {
    /// Byte offset into the input where parsing stopped.
    pub offset: usize,
    /// What was expected at that offset.
    pub reason: &'static str,
}

/// Everything that can end a command.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The request could not be completed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The server evaluated the request and reported an error.
    #[error("query error: {message}")]
    Server {
        /// Message from the server, verbatim.
        message: String,
    },

    /// The envelope carried a type tag this client does not know.
    #[error("invalid response type '{response_type}'")]
    UnknownResponseType {
        /// The offending tag.
        response_type: String,
    },

    /// The envelope carried a known tag that this operation cannot return.
    #[error("expected a '{expected}' response, got '{actual}'")]
    UnexpectedResponseType {
        /// Tag the operation requires.
        expected: &'static str,
        /// Tag the server sent.
        actual: String,
    },

    /// The payload did not match the shape its tag promises.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The decoded response could not be written out.
    #[error(transparent)]
    Format(#[from] FormatError),
}

impl QueryError {
    /// Return the CLI exit code for this error.
    ///
    /// Usage errors never reach here; clap exits with 2 for those.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Format(_) => 1,
            Self::Api(_) => 3,
            Self::Server { .. } => 4,
            Self::UnknownResponseType { .. }
            | Self::UnexpectedResponseType { .. }
            | Self::Decode(_) => 5,
        }
    }
}
