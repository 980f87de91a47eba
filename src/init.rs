use crate::context::Labels;
use crate::error::InitError;
use crate::filter::CloudLoggingFilter;
use crate::formatter::StructuredFormatter;
use crate::layer::StructuredLogLayer;
use std::io;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Registry;

/// Construction-time options for the structured log handler.
///
/// **Fields**
/// - `labels`: default labels merged into every record; labels supplied on
///   a record win on key collision.
/// - `project_id`: GCP project id. When set, trace ids are rewritten to
///   `projects/<project_id>/traces/<trace>`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HandlerConfig {
    pub labels: Labels,
    pub project_id: Option<String>,
}

impl HandlerConfig {
    /// Build the formatter, with its enrichment filter attached, that this
    /// configuration describes.
    pub fn formatter(&self) -> StructuredFormatter {
        StructuredFormatter::new(CloudLoggingFilter::new(
            self.project_id.clone(),
            self.labels.clone(),
        ))
    }
}

/// Install the structured log layer as the global default subscriber.
///
/// **Parameters**
/// - `config`: [`HandlerConfig`] with default labels and project id.
///
/// **Effects**
///
/// Installs a [`Registry`] combined with [`StructuredLogLayer`] writing to
/// standard output, and routes records from the `log` crate into it. This
/// is meant to be called once from application startup; the installation
/// lasts for the rest of the process.
///
/// **Returns**
/// - `Err(InitError::Install)` if a global subscriber is already set.
pub fn init_logging_with_config(config: HandlerConfig) -> Result<(), InitError> {
    init_logging_with_writer(config, io::stdout)
}

/// Same as [`init_logging_with_config`], but lines are written to
/// `make_writer` instead of standard output.
pub fn init_logging_with_writer<W>(config: HandlerConfig, make_writer: W) -> Result<(), InitError>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    Registry::default()
        .with(StructuredLogLayer::with_writer(config, make_writer))
        .try_init()?;
    Ok(())
}

/// Install the structured log layer configured from the environment.
///
/// Equivalent to calling [`init_logging_with_config`] with
/// [`HandlerConfig::from_env`].
pub fn init_logging() -> Result<(), InitError> {
    init_logging_with_config(HandlerConfig::from_env())
}
