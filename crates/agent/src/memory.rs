use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use ceiba_core::config::MemoryConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    Human,
    Ai,
}

impl ChatRole {
    /// Speaker label as it appears in the rendered prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Human => "Human",
            Self::Ai => "AI",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn human(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Human, content: content.into() }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Ai, content: content.into() }
    }
}

/// Per-session conversation history. Each call reads the full history or
/// appends finished turns; ordering and durability are the store's problem.
#[async_trait]
pub trait ConversationMemory: Send + Sync {
    async fn history(&self, session_id: &str) -> Result<Vec<ChatTurn>>;
    async fn append(&self, session_id: &str, turns: &[ChatTurn]) -> Result<()>;
}

/// Redis-backed history, one list per session with JSON-encoded turns.
pub struct RedisMemory {
    client: redis::Client,
}

impl RedisMemory {
    pub fn new(config: &MemoryConfig) -> Result<Self> {
        let client =
            redis::Client::open(config.url.as_str()).context("invalid conversation store URL")?;
        Ok(Self { client })
    }

    fn session_key(session_id: &str) -> String {
        format!("ceiba:session:{session_id}")
    }
}

#[async_trait]
impl ConversationMemory for RedisMemory {
    async fn history(&self, session_id: &str) -> Result<Vec<ChatTurn>> {
        let mut conn = self
            .client
            .get_async_connection()
            .await
            .context("could not reach the conversation store")?;
        let raw: Vec<String> = conn.lrange(Self::session_key(session_id), 0, -1).await?;
        raw.iter()
            .map(|entry| {
                serde_json::from_str(entry).context("corrupt turn in the session history")
            })
            .collect()
    }

    async fn append(&self, session_id: &str, turns: &[ChatTurn]) -> Result<()> {
        if turns.is_empty() {
            return Ok(());
        }
        let mut conn = self
            .client
            .get_async_connection()
            .await
            .context("could not reach the conversation store")?;
        let key = Self::session_key(session_id);
        for turn in turns {
            let payload = serde_json::to_string(turn)?;
            let _: i64 = conn.rpush(&key, payload).await?;
        }
        Ok(())
    }
}

/// Test double keeping histories in process memory.
#[derive(Default)]
pub struct InMemoryConversation {
    sessions: RwLock<HashMap<String, Vec<ChatTurn>>>,
}

impl InMemoryConversation {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationMemory for InMemoryConversation {
    async fn history(&self, session_id: &str) -> Result<Vec<ChatTurn>> {
        Ok(self.sessions.read().await.get(session_id).cloned().unwrap_or_default())
    }

    async fn append(&self, session_id: &str, turns: &[ChatTurn]) -> Result<()> {
        self.sessions
            .write()
            .await
            .entry(session_id.to_string())
            .or_default()
            .extend_from_slice(turns);
        Ok(())
    }
}
