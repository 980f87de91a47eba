use crate::context::{parse_labels, HttpRequest, Labels, LogContext, SourceLocation};
use crate::error::FormatError;
use crate::handler::StructuredLogHandler;
use crate::init::HandlerConfig;
use crate::record::{LogRecord, Severity};
use std::error::Error;
use std::io;
use tracing::field::{Field, Visit};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::{Context, Layer};

/// `tracing_subscriber` layer that writes every event as a Cloud Logging
/// structured JSON line.
///
/// Events are processed synchronously on the calling thread. Besides
/// `message`, the following event fields are recognized as per-record
/// overrides; everything else is ignored:
///
/// - `labels`: JSON object of labels, e.g. `labels = %json!({"team": "a"})`
/// - `labels.<key>`: a single label, e.g. `labels.team = "a"`
/// - `trace`, `span_id`: plain strings
/// - `http_request`, `source_location`: JSON objects
/// - `resource`: any JSON value, or a plain string
/// - `exception`: error text appended to the message
pub struct StructuredLogLayer<W = fn() -> io::Stdout> {
    handler: StructuredLogHandler<W>,
}

impl StructuredLogLayer {
    /// Create a layer writing to standard output.
    pub fn new(config: HandlerConfig) -> Self {
        Self::from_handler(StructuredLogHandler::new(config))
    }
}

impl<W> StructuredLogLayer<W>
where
    W: for<'a> MakeWriter<'a> + 'static,
{
    pub fn with_writer(config: HandlerConfig, make_writer: W) -> Self {
        Self::from_handler(StructuredLogHandler::with_writer(config, make_writer))
    }

    pub fn from_handler(handler: StructuredLogHandler<W>) -> Self {
        StructuredLogLayer { handler }
    }
}

impl<S, W> Layer<S> for StructuredLogLayer<W>
where
    S: Subscriber,
    W: for<'a> MakeWriter<'a> + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut record = match visitor.into_record(event.metadata()) {
            Ok(record) => record,
            Err(e) => {
                eprintln!("dropping log record: {}", e);
                return;
            }
        };

        if let Err(e) = self.handler.emit(&mut record) {
            eprintln!("failed to write log record: {}", e);
        }
    }
}

/// Collects message, exception and override fields from an event.
///
/// Records bridged from the `log` crate carry their real call site in
/// `log.*` fields; those take precedence over the bridge's own metadata.
#[derive(Default)]
pub struct FieldVisitor {
    message: Option<String>,
    exception: Option<String>,
    context: LogContext,
    log_module_path: Option<String>,
    log_file: Option<String>,
    log_line: Option<u32>,
    error: Option<FormatError>,
}

impl FieldVisitor {
    /// Build a [`LogRecord`] for an event with the given metadata.
    ///
    /// Fails with the first invalid override seen while visiting.
    pub fn into_record(self, meta: &Metadata<'_>) -> Result<LogRecord, FormatError> {
        if let Some(e) = self.error {
            return Err(e);
        }

        Ok(LogRecord {
            severity: Severity::from(meta.level()),
            message: self.message,
            file: self.log_file.or_else(|| meta.file().map(|s| s.to_string())),
            line: self.log_line.or_else(|| meta.line()),
            function: self
                .log_module_path
                .or_else(|| meta.module_path().map(|s| s.to_string())),
            exception: self.exception,
            context: self.context,
            enrichment: None,
        })
    }

    fn record_text(&mut self, name: &str, value: String) {
        match name {
            "message" => self.message = Some(value),
            "exception" => self.exception = Some(value),
            "trace" => self.context.trace = Some(value),
            "span_id" => self.context.span_id = Some(value),
            "labels" => match parse_labels(&value) {
                Ok(labels) => self.context.labels.get_or_insert_with(Labels::new).extend(labels),
                Err(e) => self.fail("labels", e),
            },
            "http_request" => match HttpRequest::parse(&value) {
                Ok(req) => self.context.http_request = Some(req),
                Err(e) => self.fail("http_request", e),
            },
            "source_location" => match serde_json::from_str::<SourceLocation>(&value) {
                Ok(loc) => self.context.source_location = Some(loc),
                Err(e) => self.fail("source_location", e),
            },
            "resource" => {
                let resource = serde_json::from_str(&value).unwrap_or(serde_json::Value::String(value));
                self.context.resource = Some(resource);
            }
            "log.module_path" => self.log_module_path = Some(value),
            "log.file" => self.log_file = Some(value),
            _ => {
                if let Some(key) = name.strip_prefix("labels.") {
                    self.context
                        .labels
                        .get_or_insert_with(Labels::new)
                        .insert(key.to_string(), value);
                }
            }
        }
    }

    fn fail(&mut self, field: &'static str, source: serde_json::Error) {
        if self.error.is_none() {
            self.error = Some(FormatError::InvalidOverride { field, source });
        }
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_text(field.name(), value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_text(field.name(), value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        if field.name() == "log.line" {
            self.log_line = u32::try_from(value).ok();
        } else {
            self.record_text(field.name(), value.to_string());
        }
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_text(field.name(), value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_text(field.name(), value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        let mut text = value.to_string();
        let mut source = value.source();
        while let Some(cause) = source {
            text.push_str("\nCaused by: ");
            text.push_str(&cause.to_string());
            source = cause.source();
        }
        self.record_text(field.name(), text);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record_text(field.name(), format!("{:?}", value));
    }
}
