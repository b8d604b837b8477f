use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const PREDICT_REQUESTS: &str = "predict_requests_total";
pub const PREDICT_LATENCY: &str = "predict_latency_seconds";
pub const INFERENCE_LATENCY: &str = "inference_latency_seconds";
pub const IMAGE_FETCH_BYTES: &str = "image_fetch_bytes";

/// Installs the global tracing subscriber. Falls back to `info` when the
/// directive does not parse. Returns false if a subscriber was already set.
pub fn init_tracing(directive: &str) -> bool {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .is_ok()
}

/// Installs the global Prometheus recorder and returns the handle that renders it.
pub fn install_metrics() -> anyhow::Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}
