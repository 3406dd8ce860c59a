use std::{fs::OpenOptions, sync::Arc};

use anyhow::Context;
use server::{
    api,
    config::ServerConfig,
    server_state::ServerState,
    suggestions::GeminiSuggestions,
    tracker_endpoint,
    tracking::{spawn_tracker, ChannelSource},
};
use tokio::sync::oneshot;
use tower_http::services::{ServeDir, ServeFile};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use travel_log_data_management::{route::GeoJsonRouteRenderer, DataManager};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    std::fs::create_dir_all(&config.log_dir)
        .with_context(|| format!("Failed to create log directory {:?}", config.log_dir))?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_dir.join("server.log"))
        .context("Failed to open server log")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=trace", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(file))
        .init();

    tracing::info!("Starting server...");

    let data_manager = DataManager::start(&config.storage).await?;
    let source = ChannelSource::new();
    let (tracker, tracker_task) = spawn_tracker(config.tracker, Arc::new(source.clone()), Arc::new(data_manager.clone()));

    // The device feed must be bound before the API accepts sessions.
    let (ready_tx, ready_rx) = oneshot::channel();
    let feed_source = source.clone();
    let feed_addr = config.feed_addr;
    let feed_task = tokio::spawn(async move {
        if let Err(err) = tracker_endpoint::listen(feed_addr, feed_source, ready_tx).await {
            tracing::error!("Device feed stopped: {err}");
        }
    });
    let feed_addr = ready_rx.await.context("Device feed failed to start")?;
    tracing::info!("Device feed ready on {}", feed_addr);

    let server_state = Arc::new(ServerState {
        data_manager,
        tracker,
        source,
        suggestions: Arc::new(GeminiSuggestions::new(config.gemini_api_key.clone())),
        renderer: GeoJsonRouteRenderer,
    });

    let static_dir = &config.static_dir;
    let app = api::router(server_state.clone())
        .fallback_service(ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html"))));

    let listener = tokio::net::TcpListener::bind(config.http_addr).await
        .with_context(|| format!("Failed to bind {}", config.http_addr))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    feed_task.abort();
    drop(server_state);
    let _ = tracker_task.await;
    tracing::info!("Server stopped");

    Ok(())
}
