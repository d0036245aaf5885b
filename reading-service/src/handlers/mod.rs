pub mod confirm;
pub mod health;
pub mod list;
pub mod upload;

use std::{sync::Arc, time::Instant};

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit},
    http::{header, HeaderMap},
    routing::{get, patch, post},
    Router,
};
use time::UtcOffset;
use tower_http::services::ServeDir;

use crate::{
    error::ReadingError,
    images::ImageStore,
    store::MeasurementStore,
    validation::ValidationError,
    vision::VisionClient,
};

/// Upper bound on request bodies; base64 photos are large.
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MeasurementStore>,
    pub vision: Arc<dyn VisionClient>,
    pub images: ImageStore,
    pub billing_offset: UtcOffset,
    /// Host used in image links when the request has no `Host` header.
    pub public_host: String,
    pub max_body_bytes: usize,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn MeasurementStore>,
        vision: Arc<dyn VisionClient>,
        images: ImageStore,
        billing_offset: UtcOffset,
        public_host: impl Into<String>,
    ) -> Self {
        Self {
            store,
            vision,
            images,
            billing_offset,
            public_host: public_host.into(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            started_at: Instant::now(),
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(state.images.dir());
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);

    Router::new()
        .route("/upload", post(upload::upload))
        .route("/confirm", patch(confirm::confirm))
        .route("/:customer_code/list", get(list::list))
        .route("/healthcheck", get(health::health_check))
        .nest_service("/static", static_files)
        .layer(body_limit)
        .with_state(state)
}

/// Count and log a validation failure before it becomes a response.
pub(crate) fn rejected(e: ValidationError) -> ReadingError {
    metrics::counter!(crate::metrics_server::VALIDATION_REJECTED_TOTAL).increment(1);
    tracing::warn!(error_code = e.code.as_str(), reason = %e.message, "request rejected");
    ReadingError::Validation(e)
}

/// Unparseable JSON bodies are reported like any other invalid input.
pub(crate) fn rejected_body(e: JsonRejection) -> ReadingError {
    rejected(ValidationError::invalid_data(format!("invalid JSON body: {}", e.body_text())))
}

pub(crate) fn request_host<'a>(headers: &'a HeaderMap, fallback: &'a str) -> &'a str {
    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or(fallback)
}

pub(crate) fn request_proto(headers: &HeaderMap) -> &str {
    headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .filter(|p| matches!(*p, "http" | "https"))
        .unwrap_or("http")
}
