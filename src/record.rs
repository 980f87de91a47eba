use crate::context::LogContext;
use crate::filter::Enrichment;
use std::fmt;
use tracing::Level;

/// Level name reported in the aggregator's `severity` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl From<&Level> for Severity {
    fn from(level: &Level) -> Self {
        match *level {
            Level::TRACE | Level::DEBUG => Severity::Debug,
            Level::INFO => Severity::Info,
            Level::WARN => Severity::Warning,
            Level::ERROR => Severity::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single log record flowing through filter, formatter and handler.
///
/// Built by the layer from a `tracing` event, or directly by callers that
/// emit through [`StructuredLogHandler`](crate::handler::StructuredLogHandler).
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub severity: Severity,
    /// Already-rendered message text.
    pub message: Option<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
    /// Module path of the call site; the closest thing `tracing` has to a
    /// function name.
    pub function: Option<String>,
    /// Exception text. Folded into the message and cleared on format.
    pub exception: Option<String>,
    pub context: LogContext,
    /// Derived fields, set by [`CloudLoggingFilter`](crate::filter::CloudLoggingFilter).
    pub enrichment: Option<Enrichment>,
}

impl LogRecord {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        LogRecord {
            severity,
            message: Some(message.into()),
            file: None,
            line: None,
            function: None,
            exception: None,
            context: LogContext::default(),
            enrichment: None,
        }
    }

    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_location(mut self, file: impl Into<String>, line: u32, function: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self.line = Some(line);
        self.function = Some(function.into());
        self
    }

    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }
}
