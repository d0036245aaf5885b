use std::net::SocketAddr;

use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROM_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub const UPLOADS_TOTAL: &str = "reading_uploads_total";
pub const UPLOAD_DUPLICATES_TOTAL: &str = "reading_upload_duplicates_total";
pub const CONFIRMATIONS_TOTAL: &str = "reading_confirmations_total";
pub const VALIDATION_REJECTED_TOTAL: &str = "reading_validation_rejected_total";
pub const VISION_FAILURES_TOTAL: &str = "reading_vision_failures_total";
pub const IMAGES_SWEPT_TOTAL: &str = "reading_images_swept_total";

fn describe() {
    metrics::describe_counter!(UPLOADS_TOTAL, "Readings stored by the upload endpoint");
    metrics::describe_counter!(UPLOAD_DUPLICATES_TOTAL, "Uploads rejected as a second reading for the month");
    metrics::describe_counter!(CONFIRMATIONS_TOTAL, "Readings confirmed");
    metrics::describe_counter!(VALIDATION_REJECTED_TOTAL, "Requests rejected by validation");
    metrics::describe_counter!(VISION_FAILURES_TOTAL, "Failed vision service calls or unreadable responses");
    metrics::describe_counter!(IMAGES_SWEPT_TOTAL, "Expired image files deleted by the janitor");
}

/// Install the Prometheus recorder and serve `/metrics` on `bind_addr`.
pub fn init(bind_addr: &str) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid metrics.bind_addr: {e}"))?;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("failed to install Prometheus metrics recorder: {e}"))?;

    // Ignore error if the handle was already set; this should only be called once.
    let _ = PROM_HANDLE.set(handle);
    describe();

    tokio::spawn(async move {
        let app = Router::new().route("/metrics", get(metrics_handler));

        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                tracing::info!(%addr, "metrics listener started");
                if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                    tracing::error!(error = %e, "metrics server error");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to bind metrics listener");
            }
        }
    });

    Ok(())
}

async fn metrics_handler() -> String {
    PROM_HANDLE.get().map(PrometheusHandle::render).unwrap_or_default()
}
