//! Chat and memory search endpoints

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::history::{ConversationStore, EntryKind, Memory};
use super::replies::reply_for;
use crate::config::DEFAULT_CHILD_NAME;

/// Shared conversation store
pub type SharedStore = Arc<Mutex<ConversationStore>>;

fn default_child_name() -> String {
    DEFAULT_CHILD_NAME.to_string()
}

/// Chat request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_child_name")]
    pub child_name: String,
}

/// Chat response
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub child_name: String,
    pub conversation_count: usize,
    pub memories_used: u32,
}

/// Memory search request
#[derive(Debug, Deserialize)]
pub struct MemorySearchRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_child_name")]
    pub child_name: String,
}

/// Memory search response
#[derive(Debug, Serialize)]
pub struct MemorySearchResponse {
    pub query: String,
    pub child_name: String,
    pub memories: Vec<Memory>,
    pub count: usize,
}

/// Answer a chat message and remember both sides
async fn chat_text(
    State(store): State<SharedStore>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    tracing::info!(child = %request.child_name, message = %request.message, "chat message");

    let response = reply_for(&request.message, &request.child_name);

    let conversation_count = {
        let mut store = store.lock().await;
        store.record(&request.child_name, EntryKind::User, &request.message);
        store.record(&request.child_name, EntryKind::Neo, &response)
    };

    tracing::info!(child = %request.child_name, response = %response, "Neo responded");

    Json(ChatResponse {
        response,
        child_name: request.child_name,
        conversation_count,
        memories_used: 1,
    })
}

/// Search a child's recent history
async fn search_memories(
    State(store): State<SharedStore>,
    Json(request): Json<MemorySearchRequest>,
) -> Json<MemorySearchResponse> {
    let memories = store.lock().await.search(&request.child_name, &request.query);
    tracing::debug!(child = %request.child_name, query = %request.query, hits = memories.len(), "memory search");

    Json(MemorySearchResponse {
        count: memories.len(),
        query: request.query,
        child_name: request.child_name,
        memories,
    })
}

/// Build chat router
pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/chat/text", post(chat_text))
        .route("/memories/search", post(search_memories))
        .with_state(store)
}
