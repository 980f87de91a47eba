use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Label mapping attached to every structured entry.
pub type Labels = BTreeMap<String, String>;

/// The subset of `httpRequest` fields that Cloud Logging handles
/// consistently across GCP environments.
pub const SUPPORTED_HTTP_FIELDS: [&str; 4] = ["requestMethod", "requestUrl", "userAgent", "protocol"];

/// HTTP request context restricted to [`SUPPORTED_HTTP_FIELDS`].
///
/// Unknown keys and `null` values never make it into this type, whichever
/// constructor is used.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HttpRequest(Map<String, Value>);

impl HttpRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an arbitrary mapping, dropping unsupported keys and nulls.
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        HttpRequest(
            fields
                .into_iter()
                .filter(|(k, v)| SUPPORTED_HTTP_FIELDS.contains(&k.as_str()) && !v.is_null())
                .collect(),
        )
    }

    /// Parse a JSON object and filter it like [`HttpRequest::from_fields`].
    pub fn parse(json: &str) -> Result<Self, serde_json::Error> {
        let fields: Map<String, Value> = serde_json::from_str(json)?;
        Ok(Self::from_fields(fields))
    }

    pub fn request_method(self, method: impl Into<String>) -> Self {
        self.with("requestMethod", method.into())
    }

    pub fn request_url(self, url: impl Into<String>) -> Self {
        self.with("requestUrl", url.into())
    }

    pub fn user_agent(self, agent: impl Into<String>) -> Self {
        self.with("userAgent", agent.into())
    }

    pub fn protocol(self, protocol: impl Into<String>) -> Self {
        self.with("protocol", protocol.into())
    }

    fn with(mut self, key: &str, value: String) -> Self {
        self.0.insert(key.to_string(), Value::String(value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Originating file, line and function of a log call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
}

impl SourceLocation {
    pub fn is_empty(&self) -> bool {
        self.line.is_none() && self.file.is_none() && self.function.is_none()
    }
}

/// Explicit per-record overrides.
///
/// Every member is optional; whatever is set here wins over inferred or
/// derived values when the record is enriched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogContext {
    pub labels: Option<Labels>,
    pub trace: Option<String>,
    pub span_id: Option<String>,
    pub http_request: Option<HttpRequest>,
    pub source_location: Option<SourceLocation>,
    pub resource: Option<Value>,
}

impl LogContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single label, creating the label mapping if needed.
    pub fn label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels
            .get_or_insert_with(Labels::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn labels(mut self, labels: Labels) -> Self {
        self.labels = Some(labels);
        self
    }

    pub fn trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    pub fn span_id(mut self, span_id: impl Into<String>) -> Self {
        self.span_id = Some(span_id.into());
        self
    }

    pub fn http_request(mut self, http_request: HttpRequest) -> Self {
        self.http_request = Some(http_request);
        self
    }

    pub fn source_location(mut self, source_location: SourceLocation) -> Self {
        self.source_location = Some(source_location);
        self
    }

    pub fn resource(mut self, resource: Value) -> Self {
        self.resource = Some(resource);
        self
    }
}

/// Parse a JSON object into [`Labels`].
///
/// Non-string values are kept as their JSON text.
pub fn parse_labels(json: &str) -> Result<Labels, serde_json::Error> {
    let fields: Map<String, Value> = serde_json::from_str(json)?;
    Ok(fields
        .into_iter()
        .map(|(k, v)| match v {
            Value::String(s) => (k, s),
            other => (k, other.to_string()),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn http_request_drops_unsupported_keys_and_nulls() {
        let fields = json!({
            "foo": "bar",
            "requestMethod": "GET",
            "userAgent": null,
            "protocol": "HTTP/1.1"
        });
        let Value::Object(map) = fields else { unreachable!() };

        let req = HttpRequest::from_fields(map);
        assert_eq!(req.len(), 2);
        assert_eq!(req.get("requestMethod"), Some(&json!("GET")));
        assert_eq!(req.get("protocol"), Some(&json!("HTTP/1.1")));
        assert!(req.get("foo").is_none());
        assert!(req.get("userAgent").is_none());
    }

    #[test]
    fn http_request_parse_rejects_non_objects() {
        assert!(HttpRequest::parse("[1, 2]").is_err());
        assert!(HttpRequest::parse("not json").is_err());
        let req = HttpRequest::parse(r#"{"requestUrl": "/health"}"#).unwrap();
        assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"requestUrl":"/health"}"#);
    }

    #[test]
    fn source_location_serializes_only_present_keys() {
        let loc = SourceLocation {
            line: Some(7),
            file: None,
            function: Some("app::handler".to_string()),
        };
        assert_eq!(
            serde_json::to_string(&loc).unwrap(),
            r#"{"line":7,"function":"app::handler"}"#
        );
        assert!(SourceLocation::default().is_empty());
    }

    #[test]
    fn parse_labels_stringifies_non_string_values() {
        let labels = parse_labels(r#"{"a": "1", "b": 2, "c": true}"#).unwrap();
        assert_eq!(labels.get("a").map(String::as_str), Some("1"));
        assert_eq!(labels.get("b").map(String::as_str), Some("2"));
        assert_eq!(labels.get("c").map(String::as_str), Some("true"));
    }

    #[test]
    fn context_builder_accumulates_labels() {
        let ctx = LogContext::new().label("a", "1").label("b", "2").trace("t");
        let labels = ctx.labels.unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(ctx.trace.as_deref(), Some("t"));
    }
}
