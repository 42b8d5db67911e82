//! Agent runtime - the conversational layer over the ERP core
//!
//! This crate turns one user message into one Spanish answer, calling ERP
//! tools along the way:
//! - Gates messages to ERP topics before any model call (`gate`)
//! - Renders the system prompt with tools, history, and observations (`prompt`)
//! - Talks to the completion model (`llm`) and parses its directives
//!   (`directive`)
//! - Dispatches the closed tool set against the repositories (`tools`)
//! - Guarantees the final answer is Spanish (`language`) and consults the
//!   Guatemalan SAT registry (`fiscal`)
//! - Persists per-session history in Redis (`memory`)
//!
//! # Architecture
//!
//! `AgentRuntime::respond` runs a constrained loop:
//! 1. **Topic Gate** (`gate`) - Refuse anything that is not ERP business
//! 2. **Prompt + Completion** (`prompt`, `llm`) - Ask the model for a JSON
//!    directive
//! 3. **Tool Dispatch** (`directive`, `tools`) - Execute tool actions,
//!    feed observations back into the prompt
//! 4. **Language Enforcement** (`language`) - Translate non-Spanish final
//!    answers, then store the turn (`memory`)
//!
//! # Key Types
//!
//! - `AgentRuntime` - Main orchestrator (see `runtime` module)
//! - `Toolbox` / `ToolKind` - The closed tool set and its dependencies
//! - `LlmClient`, `ConversationMemory`, `Translator`, `FiscalLookup` -
//!   Pluggable traits backed by Gemini, Redis, Google Translate, and the SAT
//!   web service in production
//!
//! # Safety Principle
//!
//! The model only chooses which tool to call. Payload validation, date
//! derivation, tax resolution, and persistence are deterministic code paths
//! it cannot override.

pub mod directive;
pub mod fiscal;
pub mod gate;
pub mod language;
pub mod llm;
pub mod memory;
pub mod prompt;
pub mod runtime;
pub mod tools;

pub use directive::{parse_directive, AgentStep};
pub use fiscal::{consultar_identificacion, FiscalLookup, SatWebService, INVALID_IDENTIFICATION};
pub use gate::{is_erp_related, OFF_TOPIC_REPLY};
pub use language::{ensure_spanish, GoogleTranslator, Translator, APOLOGY_ES};
pub use llm::{GeminiClient, LlmClient};
pub use memory::{ChatRole, ChatTurn, ConversationMemory, InMemoryConversation, RedisMemory};
pub use prompt::PromptBuilder;
pub use runtime::{AgentRuntime, DEFAULT_MAX_STEPS};
pub use tools::{local_today, ToolKind, ToolObservation, Toolbox, DONE};
