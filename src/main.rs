use databook_server::api::{
    create_column, create_row, create_sidebar_item, create_table, delete_column, delete_row,
    delete_sidebar_item, get_table_for_item, health_check, list_columns, list_rows, list_sidebar,
    rename_sidebar_item, sidebar_tree, update_column, update_row, AppState,
};
use databook_server::config::Config;
use databook_server::db;

use axum::{
    http::HeaderValue,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup log directory
    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string());

    // Create log directory if it doesn't exist
    std::fs::create_dir_all(&log_dir).unwrap_or_else(|e| {
        eprintln!("Warning: Could not create log directory {}: {}", log_dir, e);
    });

    // Create file appender with daily rotation
    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "databook-server.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize logging - both stdout and file
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,databook_server=debug")),
        )
        // Console output
        .with(fmt::layer().with_target(true))
        // File output with JSON format for easy parsing
        .with(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .json()
                .with_writer(non_blocking),
        )
        .init();

    debug!("Logging initialized - log directory: {}", log_dir);

    // Load environment from .env file if present
    if let Err(e) = dotenvy::dotenv() {
        warn!("No .env file found or error loading it: {}", e);
    }

    // Load configuration
    let config = Config::from_env()?;
    let socket_addr = config.socket_addr()?;

    info!("Starting Databook server on {}", socket_addr);
    info!("Pool max size: {}", config.pool_max_size);
    info!("Row page size: default {}, max {}", config.default_page_size, config.max_page_size);

    // Connect to the store and make sure the core relations exist
    let pool = db::create_pool(&config.database_url, config.pool_max_size)?;
    db::ping(&pool).await?;
    db::ensure_core_tables(&pool).await?;

    // CORS for the browser UI: explicit origin list, or permissive when
    // none is configured
    let cors = if config.cors_allowed_origins.is_empty() {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    };

    let state = Arc::new(AppState::new(pool, config));

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        // Sidebar tree
        .route("/sidebar", get(list_sidebar).post(create_sidebar_item))
        .route("/sidebar/tree", get(sidebar_tree))
        .route(
            "/sidebar/{id}",
            put(rename_sidebar_item).delete(delete_sidebar_item),
        )
        // Table metadata
        .route("/tables/create", post(create_table))
        .route("/tables/{id}", get(get_table_for_item))
        // Column definitions
        .route("/tables/{id}/columns", get(list_columns).post(create_column))
        .route(
            "/tables/{id}/columns/{column_id}",
            put(update_column).delete(delete_column),
        )
        // Row data
        .route("/tables/{id}/data", get(list_rows).post(create_row))
        .route(
            "/tables/{id}/data/{row_id}",
            put(update_row).delete(delete_row),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Create listener
    let listener = tokio::net::TcpListener::bind(&socket_addr).await?;
    info!("Server listening on {}", socket_addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received shutdown signal");
}
