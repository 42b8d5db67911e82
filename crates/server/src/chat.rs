//! Chat endpoint, the assistant's HTTP surface.
//!
//! `POST /api/chat` takes `{session_id, message}` and always answers
//! `200 OK` with `{response}`: either the assistant's reply or, when the
//! turn fails anywhere past the topic gate, the fixed Spanish apology.
//! Failures are logged with a correlation id; callers never see internals.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use ceiba_agent::{AgentRuntime, APOLOGY_ES};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

#[derive(Clone)]
pub struct ChatState {
    runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

pub fn router(runtime: Arc<AgentRuntime>) -> Router {
    Router::new().route("/api/chat", post(chat)).with_state(ChatState { runtime })
}

pub async fn chat(
    State(state): State<ChatState>,
    Json(body): Json<ChatRequest>,
) -> Json<ChatResponse> {
    match state.runtime.respond(&body.session_id, &body.message).await {
        Ok(reply) => Json(ChatResponse { response: reply }),
        Err(error) => {
            let chain = format!("{error:#}");
            error!(
                event_name = "chat.turn.failed",
                correlation_id = %Uuid::new_v4(),
                session_id = %body.session_id,
                error = %chain,
                "agent turn failed, answering with the apology"
            );
            Json(ChatResponse { response: APOLOGY_ES.to_string() })
        }
    }
}
