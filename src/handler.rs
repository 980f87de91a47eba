use crate::error::FormatError;
use crate::formatter::StructuredFormatter;
use crate::init::HandlerConfig;
use crate::record::LogRecord;
use std::io::{self, Write};
use tracing_subscriber::fmt::MakeWriter;

/// Formats records into Cloud Logging structured JSON and writes them, one
/// line per record, to a destination.
///
/// The destination is any [`MakeWriter`]; by default it is the process
/// standard output, which is what the GKE logging agent captures.
#[derive(Debug, Clone)]
pub struct StructuredLogHandler<W = fn() -> io::Stdout> {
    formatter: StructuredFormatter,
    make_writer: W,
}

impl StructuredLogHandler {
    /// Create a handler writing to standard output.
    pub fn new(config: HandlerConfig) -> Self {
        Self::with_writer(config, io::stdout)
    }
}

impl<W> StructuredLogHandler<W>
where
    W: for<'a> MakeWriter<'a>,
{
    /// Create a handler writing to `make_writer`.
    pub fn with_writer(config: HandlerConfig, make_writer: W) -> Self {
        Self::from_formatter(config.formatter(), make_writer)
    }

    /// Create a handler around an already-built formatter, e.g. one whose
    /// filter carries a custom [`RequestContextSource`](crate::source::RequestContextSource).
    pub fn from_formatter(formatter: StructuredFormatter, make_writer: W) -> Self {
        StructuredLogHandler { formatter, make_writer }
    }

    pub fn formatter(&self) -> &StructuredFormatter {
        &self.formatter
    }

    /// Format `record` and write it as a single newline-terminated line.
    ///
    /// **Returns**
    /// - `Ok(())` once the line was handed to the writer in one `write_all`.
    /// - `Err(..)` if formatting or the write failed. Nothing is retried.
    pub fn emit(&self, record: &mut LogRecord) -> Result<(), FormatError> {
        let mut line = self.formatter.format(record)?;
        line.push('\n');

        let mut writer = self.make_writer.make_writer();
        writer.write_all(line.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}
