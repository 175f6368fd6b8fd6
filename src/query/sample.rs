/// Samples and their two wire shapes.
///
/// A sample arrives either as a nested pair `[timestamp, "value"]` or as an
/// object with flat `value` and `timestamp` fields. Timestamps are epoch
/// seconds, sent as an integer or a float. Both shapes decode into the same
/// [`Sample`]:
/// - the value is kept as the decimal text the server sent, so nothing is
///   lost to float rounding;
/// - the timestamp is held as integer epoch milliseconds. Integer seconds
///   convert exactly; float seconds are rounded to the nearest millisecond.
use std::fmt;

use serde_json::{Map, Value};

use super::errors::DecodeError;

/// Special float spellings the server uses for non-finite values.
const SPECIAL_VALUES: [&str; 4] = ["NaN", "+Inf", "-Inf", "Inf"];

/// A point in time, held as epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// From epoch milliseconds.
    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// From whole epoch seconds. `None` on overflow.
    #[must_use]
    pub fn from_secs(secs: i64) -> Option<Self> {
        secs.checked_mul(1000).map(Self)
    }

    /// From fractional epoch seconds, rounded to the nearest millisecond.
    /// `None` for non-finite or out-of-range input.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn from_secs_f64(secs: f64) -> Option<Self> {
        let millis = (secs * 1000.0).round();
        if millis.is_finite() && millis >= i64::MIN as f64 && millis < i64::MAX as f64 {
            Some(Self(millis as i64))
        } else {
            None
        }
    }

    /// Epoch milliseconds.
    #[must_use]
    pub fn as_millis(self) -> i64 {
        self.0
    }
}

/// Whole seconds render as an integer, anything else with three decimals.
impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let (secs, millis) = (abs / 1000, abs % 1000);
        if millis == 0 {
            write!(f, "{sign}{secs}")
        } else {
            write!(f, "{sign}{secs}.{millis:03}")
        }
    }
}

/// One value at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Decimal text exactly as received.
    pub value: String,
    /// When the value was observed.
    pub timestamp: Timestamp,
}

/// Renders as `value@timestamp`.
impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.value, self.timestamp)
    }
}

/// Decode a sample in either wire shape.
///
/// # Errors
///
/// Returns `DecodeError` if `raw` is neither a `[timestamp, value]` pair nor
/// an object with `value` and `timestamp` fields, or if either part is
/// malformed.
pub fn decode_sample(raw: &Value, path: &str) -> Result<Sample, DecodeError> {
    match raw {
        Value::Array(_) => decode_pair(raw, path),
        Value::Object(fields) => decode_flat(fields, raw, path),
        _ => Err(DecodeError::new(
            path,
            "expected a [timestamp, value] pair or a {value, timestamp} object",
            raw,
        )),
    }
}

/// Decode a nested `[timestamp, value]` pair.
///
/// # Errors
///
/// Returns `DecodeError` if `raw` is not a two-element array or either
/// element is malformed.
pub fn decode_pair(raw: &Value, path: &str) -> Result<Sample, DecodeError> {
    match raw.as_array().map(Vec::as_slice) {
        Some([ts, value]) => Ok(Sample {
            timestamp: decode_timestamp(ts, &format!("{path}[0]"))?,
            value: decode_value_text(value, &format!("{path}[1]"))?,
        }),
        _ => Err(DecodeError::new(
            path,
            "expected a [timestamp, value] pair",
            raw,
        )),
    }
}

/// Decode the flat form, where `value` and `timestamp` sit side by side in
/// `fields` (which is the object `raw`).
///
/// # Errors
///
/// Returns `DecodeError` if either field is missing or malformed.
pub fn decode_flat(
    fields: &Map<String, Value>,
    raw: &Value,
    path: &str,
) -> Result<Sample, DecodeError> {
    let value = fields
        .get("value")
        .ok_or_else(|| DecodeError::missing(path, "value", raw))?;
    let timestamp = fields
        .get("timestamp")
        .ok_or_else(|| DecodeError::missing(path, "timestamp", raw))?;
    Ok(Sample {
        value: decode_value_text(value, &join(path, "value"))?,
        timestamp: decode_timestamp(timestamp, &join(path, "timestamp"))?,
    })
}

/// Decode a sample value into its decimal text.
///
/// Strings must hold a number (or `NaN`/`+Inf`/`-Inf`) and are kept
/// verbatim; bare JSON numbers are rendered with `serde_json`'s formatting.
///
/// # Errors
///
/// Returns `DecodeError` for any other JSON type or a non-numeric string.
pub fn decode_value_text(raw: &Value, path: &str) -> Result<String, DecodeError> {
    match raw {
        Value::String(s) if is_numeric(s) => Ok(s.clone()),
        Value::String(_) => Err(DecodeError::new(path, "expected a numeric string", raw)),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(DecodeError::new(path, "expected a sample value", raw)),
    }
}

/// Decode an epoch-seconds timestamp, integer or float.
///
/// # Errors
///
/// Returns `DecodeError` for non-numbers and timestamps outside the range
/// representable in epoch milliseconds.
pub fn decode_timestamp(raw: &Value, path: &str) -> Result<Timestamp, DecodeError> {
    let Value::Number(n) = raw else {
        return Err(DecodeError::new(
            path,
            "expected an epoch timestamp in seconds",
            raw,
        ));
    };
    let ts = if let Some(secs) = n.as_i64() {
        Timestamp::from_secs(secs)
    } else if n.is_u64() {
        None
    } else {
        n.as_f64().and_then(Timestamp::from_secs_f64)
    };
    ts.ok_or_else(|| DecodeError::new(path, "timestamp out of range", raw))
}

/// Append an object key to a JSON path.
#[must_use]
pub fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_owned()
    } else {
        format!("{path}.{key}")
    }
}

fn is_numeric(s: &str) -> bool {
    SPECIAL_VALUES.contains(&s) || (!s.is_empty() && s.trim() == s && s.parse::<f64>().is_ok())
}
