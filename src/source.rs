use crate::context::HttpRequest;

/// Request data inferred from ambient context rather than supplied on the
/// record itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InferredRequest {
    pub http_request: Option<HttpRequest>,
    pub trace: Option<String>,
    pub span_id: Option<String>,
}

/// Source of request context for records that carry no explicit overrides.
///
/// The filter consults this on every record. Explicit overrides on the
/// record always take precedence over whatever is returned here.
///
/// **Returns**
/// - An [`InferredRequest`] whose members are `None` when nothing could be
///   inferred. Implementations must not fail; missing context is the
///   normal case outside of a request.
pub trait RequestContextSource: Send + Sync {
    fn infer(&self) -> InferredRequest;
}

/// A source that never infers anything.
///
/// This is the default: trace, span id and HTTP request only appear in
/// output when callers supply them explicitly.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRequestContext;

impl RequestContextSource for NoRequestContext {
    fn infer(&self) -> InferredRequest {
        InferredRequest::default()
    }
}
