/// Text and CSV renderings of decoded responses.
///
/// Every renderer writes into a caller-supplied writer and reports failures
/// as `FormatError`; callers decide what to do with partial output.
use std::io::Write;

use super::errors::FormatError;
use super::response::QueryResponse;

/// Render `response` as text, one line per scalar or series.
///
/// - scalar: the bare value;
/// - vector: `<labels> <value>@<timestamp>`;
/// - matrix: `<labels> <value>@<timestamp> <value>@<timestamp> ...`.
///
/// # Errors
///
/// Returns `FormatError::Io` if writing to `out` fails.
pub fn write_text<W: Write>(response: &QueryResponse, out: &mut W) -> Result<(), FormatError> {
    match response {
        QueryResponse::Scalar(scalar) => writeln!(out, "{}", scalar.value)?,
        QueryResponse::Vector(series) => {
            for s in series {
                writeln!(out, "{} {}", s.labels, s.sample)?;
            }
        }
        QueryResponse::Matrix(series) => {
            for s in series {
                write!(out, "{}", s.labels)?;
                for sample in &s.samples {
                    write!(out, " {sample}")?;
                }
                writeln!(out)?;
            }
        }
    }
    Ok(())
}

/// Render `response` as CSV with the given single-byte delimiter.
///
/// No header row is written. Rows are:
/// - scalar: `value`;
/// - vector: `labels`, `value`, `timestamp`;
/// - matrix: `labels`, then all `value@timestamp` pairs space-joined in one
///   field.
///
/// # Errors
///
/// Returns `FormatError` if the CSV writer or the underlying writer fails.
pub fn write_csv<W: Write>(
    response: &QueryResponse,
    delimiter: u8,
    out: W,
) -> Result<(), FormatError> {
    let mut writer = csv_writer(delimiter, out);
    match response {
        QueryResponse::Scalar(scalar) => writer.write_record([scalar.value.as_str()])?,
        QueryResponse::Vector(series) => {
            for s in series {
                writer.write_record([
                    s.labels.to_string(),
                    s.sample.value.clone(),
                    s.sample.timestamp.to_string(),
                ])?;
            }
        }
        QueryResponse::Matrix(series) => {
            for s in series {
                let samples = s
                    .samples
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                writer.write_record([s.labels.to_string(), samples])?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// Write metric names, one per line.
///
/// # Errors
///
/// Returns `FormatError::Io` if writing to `out` fails.
pub fn write_names_text<W: Write>(names: &[String], out: &mut W) -> Result<(), FormatError> {
    for name in names {
        writeln!(out, "{name}")?;
    }
    Ok(())
}

/// Write metric names as single-field CSV rows.
///
/// # Errors
///
/// Returns `FormatError` if the CSV writer or the underlying writer fails.
pub fn write_names_csv<W: Write>(
    names: &[String],
    delimiter: u8,
    out: W,
) -> Result<(), FormatError> {
    let mut writer = csv_writer(delimiter, out);
    for name in names {
        writer.write_record([name.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

fn csv_writer<W: Write>(delimiter: u8, out: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::labels::LabelSet;
    use crate::query::response::{MatrixSeries, Scalar, VectorSample, decode_query_response};
    use crate::query::sample::{Sample, Timestamp};

    fn sample(value: &str, secs: i64) -> Sample {
        Sample {
            value: value.to_owned(),
            timestamp: Timestamp::from_millis(secs * 1000),
        }
    }

    fn to_text(response: &QueryResponse) -> String {
        let mut buf = Vec::new();
        write_text(response, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn to_csv(response: &QueryResponse, delimiter: u8) -> String {
        let mut buf = Vec::new();
        write_csv(response, delimiter, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn matrix() -> QueryResponse {
        QueryResponse::Matrix(vec![
            MatrixSeries {
                labels: [("__name__", "up"), ("job", "a")].into_iter().collect(),
                samples: vec![sample("1", 100), sample("0", 115)],
            },
            MatrixSeries {
                labels: [("job", "b")].into_iter().collect(),
                samples: vec![sample("1", 100)],
            },
        ])
    }

    #[test]
    fn test_scalar_text_and_csv() {
        let resp = decode_query_response(br#"{"type":"scalar","value":"42"}"#).unwrap();
        assert_eq!(to_text(&resp), "42\n");
        assert_eq!(to_csv(&resp, b';'), "42\n");
    }

    #[test]
    fn test_vector_text() {
        let resp = decode_query_response(
            br#"{"type":"vector","value":[{"metric":{"job":"x"},"value":"1.5","timestamp":100}]}"#,
        )
        .unwrap();
        assert_eq!(to_text(&resp), "{job=\"x\"} 1.5@100\n");
    }

    #[test]
    fn test_vector_csv_quotes_label_field() {
        let resp = QueryResponse::Vector(vec![VectorSample {
            labels: [("job", "x")].into_iter().collect(),
            sample: sample("1.5", 100),
        }]);
        assert_eq!(to_csv(&resp, b';'), "\"{job=\"\"x\"\"}\";1.5;100\n");
    }

    #[test]
    fn test_matrix_text() {
        assert_eq!(
            to_text(&matrix()),
            "up{job=\"a\"} 1@100 0@115\n{job=\"b\"} 1@100\n"
        );
    }

    #[test]
    fn test_matrix_csv_keeps_samples_in_one_field() {
        let out = to_csv(&matrix(), b',');
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(out.as_bytes());
        let rows: Vec<Vec<String>> = reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_owned).collect())
            .collect();
        assert_eq!(
            rows,
            vec![
                vec!["up{job=\"a\"}".to_owned(), "1@100 0@115".to_owned()],
                vec!["{job=\"b\"}".to_owned(), "1@100".to_owned()],
            ]
        );
    }

    #[test]
    fn test_delimiter_in_field_round_trips() {
        let labels: LabelSet = [("path", "a;b"), ("zone", "eu,west")].into_iter().collect();
        let resp = QueryResponse::Vector(vec![VectorSample {
            labels: labels.clone(),
            sample: sample("3", 7),
        }]);
        for delimiter in [b';', b',', b'\t', b'|'] {
            let out = to_csv(&resp, delimiter);
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .delimiter(delimiter)
                .from_reader(out.as_bytes());
            let record = reader.records().next().unwrap().unwrap();
            assert_eq!(&record[0], labels.to_string());
            assert_eq!(record[0].parse::<LabelSet>().unwrap(), labels);
            assert_eq!(&record[1], "3");
            assert_eq!(&record[2], "7");
        }
    }

    #[test]
    fn test_newline_in_label_is_escaped_in_text() {
        let resp = QueryResponse::Vector(vec![VectorSample {
            labels: [("msg", "a\nb")].into_iter().collect(),
            sample: sample("1", 1),
        }]);
        assert_eq!(to_text(&resp).lines().count(), 1);
    }

    #[test]
    fn test_empty_results_write_nothing() {
        assert_eq!(to_text(&QueryResponse::Vector(Vec::new())), "");
        assert_eq!(to_csv(&QueryResponse::Matrix(Vec::new()), b';'), "");
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let body: &[u8] = br#"{"type":"vector","value":[
            {"metric":{"b":"2","a":"1"},"value":"1","timestamp":1.5},
            {"metric":{"a":"1","b":"3"},"value":"2","timestamp":1.5}
        ]}"#;
        let first = decode_query_response(body).unwrap();
        let second = decode_query_response(body).unwrap();
        assert_eq!(to_text(&first), to_text(&second));
        assert_eq!(to_csv(&first, b';'), to_csv(&second, b';'));
        assert_eq!(
            to_text(&first),
            "{a=\"1\", b=\"2\"} 1@1.500\n{a=\"1\", b=\"3\"} 2@1.500\n"
        );
    }

    #[test]
    fn test_scalar_csv_is_single_field() {
        let resp = QueryResponse::Scalar(Scalar {
            value: "1".to_owned(),
            timestamp: None,
        });
        assert_eq!(to_csv(&resp, b';'), "1\n");
    }

    #[test]
    fn test_names() {
        let names = vec!["up".to_owned(), "odd;name".to_owned()];
        let mut buf = Vec::new();
        write_names_text(&names, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "up\nodd;name\n");

        let mut buf = Vec::new();
        write_names_csv(&names, b';', &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "up\n\"odd;name\"\n");
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn test_write_failure_is_an_error() {
        assert!(write_text(&matrix(), &mut ClosedPipe).is_err());
        assert!(write_csv(&matrix(), b';', ClosedPipe).is_err());
    }
}
