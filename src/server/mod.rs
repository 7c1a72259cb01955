//! HTTP API for form submissions.
//!
//! Every mutating handler stores first, answers from the store result, and
//! then asks the [`SyncHook`] for a background sheet sync. Sync failures never
//! change a response.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;

pub mod error;
mod routes;

pub use error::ApiError;

use crate::error::Result;
use crate::storage::SqliteStorage;
use crate::sync::SyncHook;
use routes::{
    create_form_handler, delete_form_handler, get_form_handler, health_handler,
    list_forms_handler, root_handler, update_form_handler,
};

/// Actor recorded in the audit trail for API mutations.
pub const API_ACTOR: &str = "api";

/// Shared per-server state. Holds a path, never a connection.
#[derive(Clone)]
pub struct AppState {
    db_path: Arc<PathBuf>,
    sync: Arc<dyn SyncHook>,
}

impl AppState {
    #[must_use]
    pub fn new(db_path: PathBuf, sync: Arc<dyn SyncHook>) -> Self {
        Self {
            db_path: Arc::new(db_path),
            sync,
        }
    }

    /// Run a store operation on a fresh connection off the async runtime.
    pub(crate) async fn with_storage<F, R>(&self, f: F) -> std::result::Result<R, ApiError>
    where
        F: FnOnce(&mut SqliteStorage) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let path = Arc::clone(&self.db_path);
        tokio::task::spawn_blocking(move || {
            let mut storage = SqliteStorage::open(&path)?;
            f(&mut storage)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("storage task failed: {e}")))?
        .map_err(ApiError::from)
    }
}

/// Build the router. `/forms` and `/forms/` are the same resource.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/forms", get(list_forms_handler).post(create_form_handler))
        .route("/forms/", get(list_forms_handler).post(create_form_handler))
        .route(
            "/forms/{id}",
            get(get_form_handler)
                .put(update_form_handler)
                .delete(delete_form_handler),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Server running");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::warn!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
