use crate::error::FormatError;
use crate::filter::CloudLoggingFilter;
use crate::record::LogRecord;

/// Top-level keys of a structured entry, in output order.
pub const MESSAGE_KEY: &str = "message";
pub const SEVERITY_KEY: &str = "severity";
pub const LABELS_KEY: &str = "logging.googleapis.com/labels";
pub const TRACE_KEY: &str = "logging.googleapis.com/trace";
pub const SPAN_ID_KEY: &str = "logging.googleapis.com/spanId";
pub const SOURCE_LOCATION_KEY: &str = "logging.googleapis.com/sourceLocation";
pub const HTTP_REQUEST_KEY: &str = "httpRequest";

/// Renders records in the Cloud Logging structured JSON format, one object
/// per line.
///
/// The formatter owns a [`CloudLoggingFilter`] and applies it to every
/// record before rendering.
#[derive(Debug, Clone)]
pub struct StructuredFormatter {
    filter: CloudLoggingFilter,
}

impl StructuredFormatter {
    pub fn new(filter: CloudLoggingFilter) -> Self {
        StructuredFormatter { filter }
    }

    pub fn filter(&self) -> &CloudLoggingFilter {
        &self.filter
    }

    /// Format `record` as a single JSON object without a trailing newline.
    ///
    /// The record is enriched first and keeps its
    /// [`Enrichment`](crate::filter::Enrichment). Exception text is appended
    /// to the message and then cleared from the record so it is never
    /// rendered twice.
    pub fn format(&self, record: &mut LogRecord) -> Result<String, FormatError> {
        let enrichment = self.filter.enrich(record)?;

        let text = match record.message.as_deref() {
            Some(message) if !message.is_empty() => match record.exception.as_deref() {
                Some(exception) => format!("{}\n{}", message, exception),
                None => message.to_string(),
            },
            _ => String::new(),
        };
        let message = serde_json::to_string(&text)?;
        record.exception = None;

        let line = format!(
            "{{\"{}\": {}, \"{}\": {}, \"{}\": {}, \"{}\": {}, \"{}\": {}, \"{}\": {}, \"{}\": {}}}",
            MESSAGE_KEY,
            message,
            SEVERITY_KEY,
            serde_json::to_string(record.severity.as_str())?,
            LABELS_KEY,
            enrichment.labels_str,
            TRACE_KEY,
            serde_json::to_string(&enrichment.trace_str)?,
            SPAN_ID_KEY,
            serde_json::to_string(&enrichment.span_id_str)?,
            SOURCE_LOCATION_KEY,
            enrichment.source_location_str,
            HTTP_REQUEST_KEY,
            enrichment.http_request_str,
        );
        record.enrichment = Some(enrichment);
        Ok(line)
    }
}
