//! Result output: JSON is fully implemented; MessagePack's
//! encoder is explicitly out of scope and surfaces as a
//! clear configuration error instead of a silent fallback.

use std::io::Write;

use serde::Serialize;

use crate::config::OutputFormat;
use crate::error::CliError;

pub trait ResultSink<R> {
    fn write_results(&mut self, results: &[R]) -> Result<(), CliError>;
}

pub struct JsonSink<W> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write, R: Serialize> ResultSink<R> for JsonSink<W> {
    fn write_results(&mut self, results: &[R]) -> Result<(), CliError> {
        serde_json::to_writer_pretty(&mut self.writer, results)
            .map_err(|e| CliError::Write(e.into()))?;
        self.writer.write_all(b"\n").map_err(CliError::Write)
    }
}

/// Never succeeds: MessagePack encoding is an external collaborator's
/// concern, not reimplemented here.
pub struct MsgpackSink;

impl<R> ResultSink<R> for MsgpackSink {
    fn write_results(&mut self, _results: &[R]) -> Result<(), CliError> {
        Err(CliError::UnsupportedOutputFormat(OutputFormat::Msgpack))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_sink_writes_an_array() {
        let mut buf = Vec::new();
        {
            let mut sink = JsonSink::new(&mut buf);
            sink.write_results(&[1u32, 2, 3]).unwrap();
        }
        let text = String::from_utf8(buf).unwrap();
        let parsed: Vec<u32> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, vec![1, 2, 3]);
    }

    #[test]
    fn msgpack_sink_reports_unsupported_format() {
        let mut sink = MsgpackSink;
        let err = sink.write_results(&[1u32]).unwrap_err();
        assert!(matches!(err, CliError::UnsupportedOutputFormat(OutputFormat::Msgpack)));
    }
}
