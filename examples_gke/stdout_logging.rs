use tracing::{error, info, warn};
use tracing_gke_log::init::{init_logging_with_config, HandlerConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = HandlerConfig {
        labels: [("service".to_string(), "checkout".to_string())].into_iter().collect(),
        project_id: std::env::var("GOOGLE_CLOUD_PROJECT").ok(),
    };
    init_logging_with_config(config)?;

    info!("starting service");
    warn!(labels.region = "europe-west1", "cache miss rate above threshold");

    let err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "db unreachable");
    error!(exception = %err, "order failed");
    Ok(())
}
