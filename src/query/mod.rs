/// Query domain layer: response decoding, label sets, formatting.
pub mod errors;
pub mod format;
pub mod labels;
pub mod range;
pub mod response;
pub mod sample;

pub use errors::{DecodeError, FormatError, LabelParseError, QueryError};
pub use labels::LabelSet;
pub use range::resolve_step;
pub use response::{
    MatrixSeries, QueryResponse, ResponseType, Scalar, VectorSample, decode_matrix_response,
    decode_metric_names, decode_query_response, server_error_message,
};
pub use sample::{Sample, Timestamp};
