/// Query response envelopes and their three payload shapes.
///
/// The server wraps every answer in `{"type": ..., "value": ...}`. The tag is
/// read first and alone decides how the value payload is decoded; payloads
/// are never probed speculatively against other shapes.
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::errors::{DecodeError, QueryError};
use super::labels::LabelSet;
use super::sample::{
    Sample, Timestamp, decode_pair, decode_sample, decode_timestamp, decode_value_text, join,
};

/// The type tags an envelope can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    /// A single number.
    Scalar,
    /// One sample per series, all at the same instant.
    Vector,
    /// A run of samples per series.
    Matrix,
    /// A server-side failure; the value is the message.
    Error,
}

impl ResponseType {
    /// Look up a wire tag. `None` for tags this client does not know.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "scalar" => Some(Self::Scalar),
            "vector" => Some(Self::Vector),
            "matrix" => Some(Self::Matrix),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// The wire tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Vector => "vector",
            Self::Matrix => "matrix",
            Self::Error => "error",
        }
    }
}

/// The outer object, decoded without committing to a payload shape.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type", alias = "Type")]
    response_type: String,
    #[serde(default, alias = "Value")]
    value: Value,
    #[serde(default, alias = "Version")]
    version: Option<i64>,
}

/// A scalar result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar {
    /// Decimal text exactly as received.
    pub value: String,
    /// Evaluation time, when the server sends one.
    pub timestamp: Option<Timestamp>,
}

/// One series of a vector result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorSample {
    /// Series identity.
    pub labels: LabelSet,
    /// Its single sample.
    pub sample: Sample,
}

/// One series of a matrix result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixSeries {
    /// Series identity.
    pub labels: LabelSet,
    /// Samples in the order the server sent them.
    pub samples: Vec<Sample>,
}

/// A decoded, successful query response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResponse {
    /// A single value with no labels.
    Scalar(Scalar),
    /// One sample per series.
    Vector(Vec<VectorSample>),
    /// Many samples per series.
    Matrix(Vec<MatrixSeries>),
}

impl QueryResponse {
    /// The tag this response was decoded from.
    #[must_use]
    pub fn response_type(&self) -> ResponseType {
        match self {
            Self::Scalar(_) => ResponseType::Scalar,
            Self::Vector(_) => ResponseType::Vector,
            Self::Matrix(_) => ResponseType::Matrix,
        }
    }
}

/// Decode a query response body.
///
/// # Errors
///
/// - `QueryError::Server` when the envelope is tagged `error`;
/// - `QueryError::UnknownResponseType` for tags other than
///   `scalar`/`vector`/`matrix`/`error`;
/// - `QueryError::Decode` when the body is not an envelope or the payload
///   does not match its tag.
pub fn decode_query_response(body: &[u8]) -> Result<QueryResponse, QueryError> {
    let envelope: Envelope =
        serde_json::from_slice(body).map_err(|e| DecodeError::invalid_json(&e, body))?;
    debug!(
        response_type = %envelope.response_type,
        version = ?envelope.version,
        "decoded response envelope"
    );

    let Some(response_type) = ResponseType::from_tag(&envelope.response_type) else {
        return Err(QueryError::UnknownResponseType {
            response_type: envelope.response_type,
        });
    };

    let value = &envelope.value;
    let response = match response_type {
        ResponseType::Error => {
            return Err(QueryError::Server {
                message: decode_error_message(value)?,
            });
        }
        ResponseType::Scalar => QueryResponse::Scalar(decode_scalar(value)?),
        ResponseType::Vector => QueryResponse::Vector(decode_vector(value)?),
        ResponseType::Matrix => QueryResponse::Matrix(decode_matrix(value)?),
    };
    Ok(response)
}

/// Decode a range query response, which must be a matrix.
///
/// # Errors
///
/// Everything [`decode_query_response`] returns, plus
/// `QueryError::UnexpectedResponseType` for a scalar or vector answer.
pub fn decode_matrix_response(body: &[u8]) -> Result<Vec<MatrixSeries>, QueryError> {
    match decode_query_response(body)? {
        QueryResponse::Matrix(series) => Ok(series),
        other => Err(QueryError::UnexpectedResponseType {
            expected: ResponseType::Matrix.as_str(),
            actual: other.response_type().as_str().to_owned(),
        }),
    }
}

/// Decode a metric name listing: a bare JSON array of strings.
///
/// # Errors
///
/// Returns `QueryError::Decode` if the body is not an array of strings.
pub fn decode_metric_names(body: &[u8]) -> Result<Vec<String>, QueryError> {
    let raw: Value =
        serde_json::from_slice(body).map_err(|e| DecodeError::invalid_json(&e, body))?;
    let items = raw
        .as_array()
        .ok_or_else(|| DecodeError::new("<body>", "expected an array of metric names", &raw))?;
    let names = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str()
                .map(str::to_owned)
                .ok_or_else(|| {
                    DecodeError::new(format!("[{i}]"), "expected a metric name string", item)
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

/// The server's message if `body` is an envelope tagged `error`.
///
/// Used on non-2xx answers, where the body may or may not be an envelope.
#[must_use]
pub fn server_error_message(body: &[u8]) -> Option<String> {
    let envelope: Envelope = serde_json::from_slice(body).ok()?;
    if ResponseType::from_tag(&envelope.response_type) != Some(ResponseType::Error) {
        return None;
    }
    envelope.value.as_str().map(str::to_owned)
}

fn decode_error_message(value: &Value) -> Result<String, DecodeError> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| DecodeError::new("value", "expected the error message string", value))
}

fn decode_scalar(value: &Value) -> Result<Scalar, DecodeError> {
    if value.is_array() {
        let sample = decode_pair(value, "value")?;
        return Ok(Scalar {
            value: sample.value,
            timestamp: Some(sample.timestamp),
        });
    }
    Ok(Scalar {
        value: decode_value_text(value, "value")?,
        timestamp: None,
    })
}

fn decode_vector(value: &Value) -> Result<Vec<VectorSample>, DecodeError> {
    series_items(value)?
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let path = format!("value[{i}]");
            let fields = item
                .as_object()
                .ok_or_else(|| DecodeError::new(&path, "expected a series object", item))?;
            let labels = decode_labels(fields.get("metric"), item, &path)?;
            let raw_value = fields
                .get("value")
                .ok_or_else(|| DecodeError::missing(&path, "value", item))?;

            let sample = if raw_value.is_array() {
                decode_pair(raw_value, &join(&path, "value"))?
            } else {
                let raw_ts = fields
                    .get("timestamp")
                    .ok_or_else(|| DecodeError::missing(&path, "timestamp", item))?;
                Sample {
                    value: decode_value_text(raw_value, &join(&path, "value"))?,
                    timestamp: decode_timestamp(raw_ts, &join(&path, "timestamp"))?,
                }
            };
            Ok(VectorSample { labels, sample })
        })
        .collect()
}

fn decode_matrix(value: &Value) -> Result<Vec<MatrixSeries>, DecodeError> {
    series_items(value)?
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let path = format!("value[{i}]");
            let fields = item
                .as_object()
                .ok_or_else(|| DecodeError::new(&path, "expected a series object", item))?;
            let labels = decode_labels(fields.get("metric"), item, &path)?;
            let values_path = join(&path, "values");
            let raw_values = fields
                .get("values")
                .ok_or_else(|| DecodeError::missing(&path, "values", item))?;
            let samples = raw_values
                .as_array()
                .ok_or_else(|| {
                    DecodeError::new(&values_path, "expected an array of samples", raw_values)
                })?
                .iter()
                .enumerate()
                .map(|(j, raw)| decode_sample(raw, &format!("{values_path}[{j}]")))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(MatrixSeries { labels, samples })
        })
        .collect()
}

fn series_items(value: &Value) -> Result<&Vec<Value>, DecodeError> {
    value
        .as_array()
        .ok_or_else(|| DecodeError::new("value", "expected an array of series", value))
}

fn decode_labels(raw: Option<&Value>, item: &Value, path: &str) -> Result<LabelSet, DecodeError> {
    let raw = raw.ok_or_else(|| DecodeError::missing(path, "metric", item))?;
    let path = join(path, "metric");
    let fields = raw
        .as_object()
        .ok_or_else(|| DecodeError::new(&path, "expected a label object", raw))?;
    fields
        .iter()
        .map(|(name, value)| {
            value
                .as_str()
                .map(|v| (name.clone(), v.to_owned()))
                .ok_or_else(|| {
                    DecodeError::new(join(&path, name), "expected a label value string", value)
                })
        })
        .collect()
}
