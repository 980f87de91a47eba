use tracing::info;
use tracing_gke_log::{
    CloudLoggingFilter, HttpRequest, LogContext, LogRecord, Severity, StructuredFormatter,
    StructuredLogHandler, StructuredLogLayer,
};
use tracing_subscriber::layer::SubscriberExt;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Records can also be built and emitted directly, without going
    // through a `tracing` subscriber.
    let filter = CloudLoggingFilter::new(Some("my-project".to_string()), Default::default());
    let handler = StructuredLogHandler::from_formatter(StructuredFormatter::new(filter), std::io::stdout);

    let mut record = LogRecord::new(Severity::Info, "GET /orders served")
        .with_location(file!(), line!(), module_path!())
        .with_context(
            LogContext::new()
                .trace("4bf92f3577b34da6a3ce929d0e0e4736")
                .span_id("00f067aa0ba902b7")
                .label("route", "/orders")
                .http_request(
                    HttpRequest::new()
                        .request_method("GET")
                        .request_url("/orders")
                        .protocol("HTTP/1.1"),
                ),
        );
    handler.emit(&mut record)?;

    // The same handler wrapped in a layer serves every `tracing` event.
    let subscriber = tracing_subscriber::registry().with(StructuredLogLayer::from_handler(handler));
    tracing::subscriber::with_default(subscriber, || {
        info!(trace = "4bf92f3577b34da6a3ce929d0e0e4736", "done");
    });
    Ok(())
}
