//! Companion chat service
//!
//! A small HTTP service answering chat messages with keyword-matched replies and
//! keeping per-child history in memory.

pub mod chat;
pub mod health;
pub mod history;
pub mod replies;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use chat::SharedStore;
pub use history::ConversationStore;
pub use replies::reply_for;

use crate::Result;

/// Default port for the companion service
pub const DEFAULT_PORT: u16 = 5000;

/// Build the router with all routes
pub fn router(store: SharedStore) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(health::router())
        .merge(chat::router(store))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Companion chat server
pub struct CompanionServer {
    store: SharedStore,
    port: u16,
}

impl CompanionServer {
    /// Create a server with empty history
    #[must_use]
    pub fn new(port: u16) -> Self {
        Self {
            store: Arc::new(Mutex::new(ConversationStore::new())),
            port,
        }
    }

    /// Shared history, for inspection
    #[must_use]
    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.store)
    }

    /// Bind every interface on the configured port and serve
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind chat server: {e}")))?;

        self.serve(listener).await
    }

    /// Serve on an already bound listener
    ///
    /// # Errors
    ///
    /// Returns error if the server fails
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        let local = listener.local_addr()?;
        tracing::info!(addr = %local, "chat server listening");

        axum::serve(listener, router(self.store))
            .await
            .map_err(|e| crate::Error::Config(format!("chat server error: {e}")))?;

        Ok(())
    }

    /// Serve on a listener in a background task
    #[must_use]
    pub fn spawn(self, listener: TcpListener) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.serve(listener).await })
    }
}
