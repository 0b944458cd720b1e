//! Restock Sentinel Binary
//!
//! Runs the pollers, the notification batcher and, with the `service`
//! feature, the read-only query API:
//! - Structured JSON logging for Cloud Logging
//! - One poller per catalog, isolated from the others
//! - Graceful shutdown on Ctrl+C / SIGTERM
//!
//! ## Configuration
//!
//! See [`restock_sentinel::config`] for the full list. Logging:
//! - `RUST_LOG`: Log level filter (default: restock_sentinel=info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! NOTIFY_WEBHOOK_URL=https://... cargo run --bin restock_sentinel --features service
//! ```

use std::sync::Arc;
use std::time::Duration;

use regex_lite::Regex;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use restock_sentinel::{
    Brand, CatalogConfig, JsonCatalogSource, JsonFileLedger, LedgerStore, LogAlert, LogSink,
    NotificationBatcher, NotificationSink, OperatorAlert, PollOrchestrator, SentinelConfig,
    SnapshotTable, Source, WebhookAlert, WebhookSink,
};

/// Title filter for matcha powders.
const MATCHA_FILTER: &str = r"(?i)\bmatcha\b";

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "restock_sentinel=info,tower_http=info".into());

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_span_events(FmtSpan::CLOSE))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE)
                    .flatten_event(true),
            )
            .init();
    }
}

/// Catalogs with a storefront product feed.
///
/// Marukyu Koyamaen and Sazen publish no feed and have no adapter here.
fn catalogs(filter: &Regex) -> Vec<CatalogConfig> {
    vec![
        CatalogConfig::new(Source::Ippodo, "https://ippodotea.com", "matcha")
            .with_brand(Brand::Ippodo)
            .with_name_filter(filter.clone()),
        CatalogConfig::new(Source::NakamuraTokichi, "https://global.tokichi.jp", "matcha")
            .with_brand(Brand::NakamuraTokichi)
            .with_name_filter(filter.clone()),
        CatalogConfig::new(Source::SteepingRoom, "https://www.thesteepingroom.com", "matcha-tea")
            .with_name_filter(filter.clone()),
    ]
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

/// Resolve once shutdown has been requested or the sender is gone.
async fn wait_for_shutdown(mut shutdown: watch::Receiver<bool>) {
    while !*shutdown.borrow() {
        if shutdown.changed().await.is_err() {
            break;
        }
    }
}

#[cfg(feature = "service")]
async fn serve_api(
    config: &SentinelConfig,
    store: Arc<dyn LedgerStore>,
    shutdown: watch::Receiver<bool>,
) -> Result<(), Box<dyn std::error::Error>> {
    use axum::middleware;
    use restock_sentinel::service::{create_router, request_logging, ServiceState};
    use std::net::SocketAddr;
    use tokio::net::TcpListener;
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(ServiceState::new(store))
        .layer(middleware::from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!(address = %addr, "Query API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown(shutdown))
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let version = env!("CARGO_PKG_VERSION");
    let build_sha = option_env!("BUILD_SHA").unwrap_or("dev");
    info!(version = version, build_sha = build_sha, "Starting Restock Sentinel");

    let config = SentinelConfig::from_env()?;
    let client = reqwest::Client::builder()
        .timeout(config.poll_timeout + Duration::from_secs(1))
        .user_agent(concat!("restock-sentinel/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let store: Arc<dyn LedgerStore> = Arc::new(JsonFileLedger::new(config.state_file.clone()));
    let ledger = store.load().await?;
    info!(
        path = %config.state_file.display(),
        sources = ledger.num_sources(),
        items = ledger.num_items(),
        "Ledger loaded"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let table = SnapshotTable::new();

    let filter = Regex::new(MATCHA_FILTER)?;
    let mut orchestrator = PollOrchestrator::new(table.clone(), shutdown_rx.clone());
    for catalog in catalogs(&filter) {
        let schedule = config.schedule_for(catalog.source);
        orchestrator.spawn(Arc::new(JsonCatalogSource::new(catalog, client.clone())), schedule);
    }

    let sink: Arc<dyn NotificationSink> = match &config.notify_webhook_url {
        Some(url) => Arc::new(WebhookSink::new(url.as_str(), client.clone())),
        None => {
            warn!("NOTIFY_WEBHOOK_URL not set, restock notifications will only be logged");
            Arc::new(LogSink)
        }
    };
    let alert: Arc<dyn OperatorAlert> = match &config.operator_webhook_url {
        Some(url) => Arc::new(WebhookAlert::new(url.as_str(), client.clone())),
        None => Arc::new(LogAlert),
    };

    let batcher = NotificationBatcher::new(
        Arc::clone(&store),
        table,
        sink,
        alert,
        config.batcher_config(),
    );
    let batcher_task = tokio::spawn(batcher.run(shutdown_rx.clone()));

    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    info!(sources = ?orchestrator.sources(), "Ready");

    #[cfg(feature = "service")]
    serve_api(&config, Arc::clone(&store), shutdown_rx.clone()).await?;

    #[cfg(not(feature = "service"))]
    wait_for_shutdown(shutdown_rx.clone()).await;

    orchestrator.join().await;
    if let Err(e) = batcher_task.await {
        warn!(error = %e, "Batcher task ended abnormally");
    }

    info!("Restock Sentinel shutdown complete");
    Ok(())
}
