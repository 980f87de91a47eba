/// Error returned when a record cannot be turned into a structured line
/// or written to the output stream.
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("failed to serialize log record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write log line: {0}")]
    Io(#[from] std::io::Error),

    /// A per-record override field carried a value that is not valid JSON
    /// of the expected shape.
    #[error("invalid `{field}` override: {source}")]
    InvalidOverride {
        field: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Error returned when installing the global subscriber fails.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("failed to install global subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}
