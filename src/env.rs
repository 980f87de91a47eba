//! Environment variable names used to configure the handler from a
//! deployment manifest.
//!
//! These are purely helpers; the handler itself never reads the
//! environment unless [`HandlerConfig::from_env`] is called.

use crate::context::Labels;
use crate::init::HandlerConfig;

/// GCP project id used to qualify trace ids.
pub const GKE_LOG_PROJECT_ID_ENV: &str = "GKE_LOG_PROJECT_ID";

/// Project id variable set by GCP runtimes, used when
/// [`GKE_LOG_PROJECT_ID_ENV`] is not set.
pub const GOOGLE_CLOUD_PROJECT_ENV: &str = "GOOGLE_CLOUD_PROJECT";

/// Default labels as `key=value` pairs separated by commas.
pub const GKE_LOG_LABELS_ENV: &str = "GKE_LOG_LABELS";

/// Read a non-empty environment variable.
pub fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse `key=value,key2=value2` into labels.
///
/// Empty segments and segments without `=` are skipped; keys and values
/// are trimmed.
pub fn parse_label_pairs(raw: &str) -> Labels {
    raw.split(',')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| (k.trim(), v.trim()))
        .filter(|(k, _)| !k.is_empty())
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl HandlerConfig {
    /// Build a configuration from [`GKE_LOG_PROJECT_ID_ENV`] (falling back
    /// to [`GOOGLE_CLOUD_PROJECT_ENV`]) and [`GKE_LOG_LABELS_ENV`].
    pub fn from_env() -> Self {
        HandlerConfig {
            labels: env_opt(GKE_LOG_LABELS_ENV)
                .map(|raw| parse_label_pairs(&raw))
                .unwrap_or_default(),
            project_id: env_opt(GKE_LOG_PROJECT_ID_ENV).or_else(|| env_opt(GOOGLE_CLOUD_PROJECT_ENV)),
        }
    }
}
