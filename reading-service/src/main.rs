use anyhow::Result;
use reading_service::{
    build_router,
    config::AppConfig,
    images::ImageStore,
    janitor,
    metrics_server,
    observability,
    store::PgMeasurementStore,
    vision::GeminiVisionClient,
    AppState,
};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let billing_offset = cfg.billing.utc_offset()?;

    let pool = PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect(&cfg.database.uri)
        .await?;
    let store = PgMeasurementStore::new(pool);

    let vision = GeminiVisionClient::new(
        &cfg.vision.endpoint,
        &cfg.vision.model,
        cfg.vision.api_key()?,
        cfg.vision.request_timeout(),
    )?;

    let images = ImageStore::new(&cfg.server.images_dir);
    tokio::fs::create_dir_all(images.dir()).await?;

    let _janitor = janitor::spawn(
        images.dir().to_path_buf(),
        Duration::from_secs(cfg.janitor.sweep_interval_secs),
        Duration::from_secs(cfg.janitor.image_ttl_secs),
    );

    let state = AppState::new(
        Arc::new(store),
        Arc::new(vision),
        images,
        billing_offset,
        cfg.server.public_host.clone(),
    )
    .with_max_body_bytes(cfg.server.max_body_bytes);
    let app = build_router(state);

    let addr: SocketAddr = cfg
        .server
        .bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid server.bind_addr: {e}"))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, images_dir = %cfg.server.images_dir.display(), "reading service listening");

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
