//! Google Cloud Logging structured output for `tracing`.
//!
//! Every event becomes one JSON object per line on standard output, in the
//! format the GKE logging agent parses into a structured `LogEntry`:
//! severity, labels, trace, span id, source location and HTTP request.
//!
//! ```ignore
//! use tracing_gke_log::init::{init_logging_with_config, HandlerConfig};
//!
//! init_logging_with_config(HandlerConfig {
//!     project_id: Some("my-project".to_string()),
//!     ..HandlerConfig::default()
//! })?;
//!
//! tracing::info!(trace = "abc123", labels.team = "core", "request served");
//! ```

pub mod context;
pub mod env;
pub mod error;
pub mod filter;
pub mod formatter;
pub mod handler;
pub mod init;
pub mod layer;
pub mod record;
pub mod source;

pub use context::{HttpRequest, Labels, LogContext, SourceLocation};
pub use error::{FormatError, InitError};
pub use filter::{CloudLoggingFilter, Enrichment};
pub use formatter::StructuredFormatter;
pub use handler::StructuredLogHandler;
pub use init::{init_logging, init_logging_with_config, init_logging_with_writer, HandlerConfig};
pub use layer::StructuredLogLayer;
pub use record::{LogRecord, Severity};
pub use source::{InferredRequest, NoRequestContext, RequestContextSource};
