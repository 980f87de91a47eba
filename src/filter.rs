use crate::context::{HttpRequest, Labels, SourceLocation};
use crate::error::FormatError;
use crate::record::LogRecord;
use crate::source::{NoRequestContext, RequestContextSource};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Derived Cloud Logging fields attached to a [`LogRecord`].
///
/// The structured members are kept alongside their JSON renderings so the
/// formatter can splice the latter straight into the output line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub resource: Option<Value>,
    pub trace: Option<String>,
    pub span_id: Option<String>,
    pub http_request: Option<HttpRequest>,
    pub source_location: Option<SourceLocation>,
    pub labels: Option<Labels>,
    pub trace_str: String,
    pub span_id_str: String,
    pub http_request_str: String,
    pub source_location_str: String,
    pub labels_str: String,
    /// Raw message with double quotes backslash-escaped.
    pub escaped_message: Option<String>,
}

/// Adds Cloud Logging data to each record that passes through it.
///
/// Values set on the record's [`LogContext`](crate::context::LogContext)
/// override anything inferred by the configured [`RequestContextSource`].
///
/// With a project configured, traces become
/// `projects/<project>/traces/<trace>`; a trace that already starts with
/// `projects/` is left untouched.
#[derive(Clone)]
pub struct CloudLoggingFilter {
    project: Option<String>,
    default_labels: Labels,
    source: Arc<dyn RequestContextSource>,
}

impl CloudLoggingFilter {
    pub fn new(project: Option<String>, default_labels: Labels) -> Self {
        Self::with_source(project, default_labels, Arc::new(NoRequestContext))
    }

    pub fn with_source(
        project: Option<String>,
        default_labels: Labels,
        source: Arc<dyn RequestContextSource>,
    ) -> Self {
        CloudLoggingFilter { project, default_labels, source }
    }

    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    /// Compute and attach [`Enrichment`] for `record`.
    ///
    /// Returns `Ok(true)`: this filter never suppresses records.
    pub fn process(&self, record: &mut LogRecord) -> Result<bool, FormatError> {
        record.enrichment = Some(self.enrich(record)?);
        Ok(true)
    }

    /// Compute [`Enrichment`] for `record` without attaching it.
    ///
    /// Always recomputes from the record's raw inputs, never from a previous
    /// enrichment, so repeated calls yield the same result.
    pub fn enrich(&self, record: &LogRecord) -> Result<Enrichment, FormatError> {
        let ctx = &record.context;
        let inferred = self.source.infer();

        let trace = match &ctx.trace {
            Some(trace) => Some(trace.clone()),
            None => inferred.trace,
        }
        .filter(|t| !t.is_empty())
        .map(|t| self.qualify_trace(t));

        let span_id = match &ctx.span_id {
            Some(span_id) => Some(span_id.clone()),
            None => inferred.span_id,
        }
        .filter(|s| !s.is_empty());

        let http_request = ctx
            .http_request
            .clone()
            .or(inferred.http_request)
            .filter(|r| !r.is_empty());

        let source_location = match &ctx.source_location {
            Some(loc) => Some(loc.clone()),
            None => Some(SourceLocation {
                line: record.line,
                file: record.file.clone(),
                function: record.function.clone(),
            }),
        }
        .filter(|loc| !loc.is_empty());

        let mut labels = self.default_labels.clone();
        if let Some(user_labels) = &ctx.labels {
            labels.extend(user_labels.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        let labels = Some(labels).filter(|l| !l.is_empty());

        Ok(Enrichment {
            resource: ctx.resource.clone(),
            trace_str: trace.clone().unwrap_or_default(),
            span_id_str: span_id.clone().unwrap_or_default(),
            http_request_str: json_or_empty(http_request.as_ref())?,
            source_location_str: json_or_empty(source_location.as_ref())?,
            labels_str: json_or_empty(labels.as_ref())?,
            escaped_message: record
                .message
                .as_deref()
                .filter(|m| !m.is_empty())
                .map(|m| m.replace('"', "\\\"")),
            trace,
            span_id,
            http_request,
            source_location,
            labels,
        })
    }

    /// Rewrite `trace` to `projects/<project>/traces/<trace>` when a project
    /// is configured. Traces already starting with `projects/` are kept as is.
    fn qualify_trace(&self, trace: String) -> String {
        match &self.project {
            Some(project) if !trace.starts_with("projects/") => {
                format!("projects/{}/traces/{}", project, trace)
            }
            _ => trace,
        }
    }
}

impl fmt::Debug for CloudLoggingFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudLoggingFilter")
            .field("project", &self.project)
            .field("default_labels", &self.default_labels)
            .finish_non_exhaustive()
    }
}

fn json_or_empty<T: serde::Serialize>(value: Option<&T>) -> Result<String, serde_json::Error> {
    match value {
        Some(v) => serde_json::to_string(v),
        None => Ok("{}".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::LogContext;
    use crate::record::Severity;
    use crate::source::InferredRequest;
    use serde_json::json;

    fn labels(pairs: &[(&str, &str)]) -> Labels {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    fn enrich(filter: &CloudLoggingFilter, record: &mut LogRecord) -> Enrichment {
        assert!(filter.process(record).unwrap());
        record.enrichment.clone().unwrap()
    }

    struct FixedSource(InferredRequest);

    impl RequestContextSource for FixedSource {
        fn infer(&self) -> InferredRequest {
            self.0.clone()
        }
    }

    #[test]
    fn no_overrides_and_no_defaults_yield_empty_objects() {
        let filter = CloudLoggingFilter::new(None, Labels::new());
        let mut record = LogRecord::new(Severity::Info, "hello");

        let e = enrich(&filter, &mut record);
        assert_eq!(e.labels, None);
        assert_eq!(e.labels_str, "{}");
        assert_eq!(e.http_request_str, "{}");
        assert_eq!(e.source_location, None);
        assert_eq!(e.source_location_str, "{}");
        assert_eq!(e.trace_str, "");
        assert_eq!(e.span_id_str, "");
        assert_eq!(e.resource, None);
    }

    #[test]
    fn labels_merge_with_record_labels_winning() {
        let filter = CloudLoggingFilter::new(None, labels(&[("b", "2")]));

        let mut record = LogRecord::new(Severity::Info, "m")
            .with_context(LogContext::new().label("a", "1"));
        let e = enrich(&filter, &mut record);
        assert_eq!(e.labels, Some(labels(&[("a", "1"), ("b", "2")])));
        assert_eq!(e.labels_str, r#"{"a":"1","b":"2"}"#);

        let mut record = LogRecord::new(Severity::Info, "m")
            .with_context(LogContext::new().label("b", "9"));
        let e = enrich(&filter, &mut record);
        assert_eq!(e.labels, Some(labels(&[("b", "9")])));
    }

    #[test]
    fn trace_is_qualified_only_with_project() {
        let ctx = LogContext::new().trace("abc123");

        let filter = CloudLoggingFilter::new(Some("proj1".to_string()), Labels::new());
        let mut record = LogRecord::new(Severity::Info, "m").with_context(ctx.clone());
        assert_eq!(enrich(&filter, &mut record).trace_str, "projects/proj1/traces/abc123");

        let filter = CloudLoggingFilter::new(None, Labels::new());
        let mut record = LogRecord::new(Severity::Info, "m").with_context(ctx);
        assert_eq!(enrich(&filter, &mut record).trace_str, "abc123");
    }

    #[test]
    fn qualified_trace_is_not_prefixed_twice() {
        let filter = CloudLoggingFilter::new(Some("proj1".to_string()), Labels::new());
        let mut record = LogRecord::new(Severity::Info, "m")
            .with_context(LogContext::new().trace("projects/other/traces/t1"));
        assert_eq!(enrich(&filter, &mut record).trace.as_deref(), Some("projects/other/traces/t1"));
    }

    #[test]
    fn empty_trace_and_span_are_absent() {
        let filter = CloudLoggingFilter::new(Some("p".to_string()), Labels::new());
        let mut record = LogRecord::new(Severity::Info, "m")
            .with_context(LogContext::new().trace("").span_id(""));
        let e = enrich(&filter, &mut record);
        assert_eq!(e.trace, None);
        assert_eq!(e.span_id, None);
        assert_eq!(e.trace_str, "");
    }

    #[test]
    fn explicit_overrides_win_over_inferred_values() {
        let source = FixedSource(InferredRequest {
            http_request: Some(HttpRequest::new().request_method("POST")),
            trace: Some("inferred".to_string()),
            span_id: Some("s-inferred".to_string()),
        });
        let filter = CloudLoggingFilter::with_source(Some("p".to_string()), Labels::new(), Arc::new(source));

        let mut record = LogRecord::new(Severity::Info, "m");
        let e = enrich(&filter, &mut record);
        assert_eq!(e.trace.as_deref(), Some("projects/p/traces/inferred"));
        assert_eq!(e.span_id.as_deref(), Some("s-inferred"));
        assert_eq!(e.http_request_str, r#"{"requestMethod":"POST"}"#);

        let mut record = LogRecord::new(Severity::Info, "m").with_context(
            LogContext::new()
                .trace("explicit")
                .span_id("s1")
                .http_request(HttpRequest::new().request_method("GET")),
        );
        let e = enrich(&filter, &mut record);
        assert_eq!(e.trace.as_deref(), Some("projects/p/traces/explicit"));
        assert_eq!(e.span_id.as_deref(), Some("s1"));
        assert_eq!(e.http_request_str, r#"{"requestMethod":"GET"}"#);
    }

    #[test]
    fn source_location_derived_from_record_or_overridden() {
        let filter = CloudLoggingFilter::new(None, Labels::new());

        let mut record = LogRecord::new(Severity::Error, "m").with_location("src/main.rs", 12, "app::main");
        let e = enrich(&filter, &mut record);
        assert_eq!(
            e.source_location_str,
            r#"{"line":12,"file":"src/main.rs","function":"app::main"}"#
        );

        let mut record = LogRecord::new(Severity::Error, "m")
            .with_location("src/main.rs", 12, "app::main")
            .with_context(LogContext::new().source_location(SourceLocation {
                line: Some(1),
                file: Some("other.rs".to_string()),
                function: None,
            }));
        let e = enrich(&filter, &mut record);
        assert_eq!(e.source_location_str, r#"{"line":1,"file":"other.rs"}"#);
    }

    #[test]
    fn message_quotes_are_escaped() {
        let filter = CloudLoggingFilter::new(None, Labels::new());
        let mut record = LogRecord::new(Severity::Info, r#"say "hi""#);
        assert_eq!(enrich(&filter, &mut record).escaped_message.as_deref(), Some(r#"say \"hi\""#));

        let mut record = LogRecord::new(Severity::Info, "");
        assert_eq!(enrich(&filter, &mut record).escaped_message, None);
    }

    #[test]
    fn resource_is_passed_through() {
        let filter = CloudLoggingFilter::new(None, Labels::new());
        let mut record = LogRecord::new(Severity::Info, "m")
            .with_context(LogContext::new().resource(json!({"type": "k8s_container"})));
        assert_eq!(enrich(&filter, &mut record).resource, Some(json!({"type": "k8s_container"})));
    }

    #[test]
    fn processing_twice_is_idempotent() {
        let filter = CloudLoggingFilter::new(Some("p".to_string()), labels(&[("env", "prod")]));
        let mut record = LogRecord::new(Severity::Warning, "m")
            .with_location("lib.rs", 3, "crate::f")
            .with_context(LogContext::new().trace("t").label("k", "v"));

        let first = enrich(&filter, &mut record);
        let second = enrich(&filter, &mut record);
        assert_eq!(first, second);
        assert_eq!(second.trace.as_deref(), Some("projects/p/traces/t"));
    }
}
