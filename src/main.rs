//! Chat widget demo server
//!
//! Serves one chat session over HTTP and SSE, answered by the canned
//! reply stub.

use chat_widget::api::{create_router, AppState};
use chat_widget::reply::{CannedReplies, LoggingGenerator, DEFAULT_REPLY};
use chat_widget::session_store::{MemoryMedium, SessionStore, SqliteMedium};
use chat_widget::{start_session, WidgetConfig};
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_widget=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = WidgetConfig::from_env();

    // Storage medium
    let store = match &config.db_path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            tracing::info!(path = %path.display(), "Opening session database");
            SessionStore::new(SqliteMedium::open(path)?)
        }
        None => {
            tracing::info!("No CHAT_WIDGET_DB_PATH set, session lives in memory");
            SessionStore::new(MemoryMedium::new())
        }
    };

    // Reply generator
    let generator = LoggingGenerator::new(CannedReplies::new(
        vec![DEFAULT_REPLY.to_string()],
        config.reply_delay,
    ));

    let session = start_session(store, generator, config.assistant_name.clone());
    let state = AppState::new(session, config.menu.clone());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Chat widget server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
