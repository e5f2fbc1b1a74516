//! Router assembly and server lifecycle.

use std::sync::Arc;

use axum::{extract::State, response::Json, routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::create::{SimulatedCreator, TaskCreator};
use crate::search::SearchSessions;
use crate::task::{InMemoryTaskProvider, Priority, TaskProvider};

use super::tasks as tasks_api;
use super::types::{HealthResponse, PriorityOption};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Read-only task collection
    pub provider: Arc<dyn TaskProvider>,
    /// Receiver of validated form submissions
    pub creator: Arc<dyn TaskCreator>,
    /// Per-client search sessions
    pub searches: SearchSessions,
}

impl AppState {
    /// Wire the simulated creator and the search sessions to `provider`.
    pub fn new(config: Config, provider: Arc<dyn TaskProvider>) -> Self {
        let creator: Arc<dyn TaskCreator> = Arc::new(SimulatedCreator::new(
            Arc::clone(&provider),
            config.submit_delay,
        ));
        let searches = SearchSessions::new(
            Arc::clone(&provider),
            config.page_size,
            config.search_delay,
        );
        Self {
            config,
            provider,
            creator,
            searches,
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/api/health", get(health))
        .route("/api/priorities", get(list_priorities))
        .nest("/api/tasks", tasks_api::routes())
        .layer(TraceLayer::new_for_http());

    if state.config.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    app.with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let provider = match &config.tasks_file {
        Some(path) => {
            let provider = InMemoryTaskProvider::from_json_file(path).await?;
            tracing::info!("Loaded {} tasks from {}", provider.len(), path.display());
            provider
        }
        None => {
            let provider = InMemoryTaskProvider::seeded()?;
            tracing::info!("Serving {} demo tasks", provider.len());
            provider
        }
    };

    let state = Arc::new(AppState::new(config.clone(), Arc::new(provider)));
    let app = router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        task_count: state.provider.all_tasks().await.len(),
    })
}

/// Priorities selectable in the search and create forms.
async fn list_priorities() -> Json<Vec<PriorityOption>> {
    Json(
        Priority::ALL
            .iter()
            .map(|&priority| PriorityOption {
                label: priority.label(),
                value: priority,
            })
            .collect(),
    )
}
