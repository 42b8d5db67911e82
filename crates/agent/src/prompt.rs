//! Prompt assembly for the reasoning loop.
//!
//! One Tera template carries the whole system prompt: the Spanish-only
//! instructions, the advertised tool set, the session history, and any tool
//! observations already collected this turn. The template is embedded so the
//! binary does not depend on a templates directory at runtime.

use anyhow::{Context as _, Result};
use serde::Serialize;
use tera::{Context, Tera};

use crate::memory::ChatTurn;
use crate::tools::{ToolKind, ToolObservation};

const AGENT_TEMPLATE: &str = "agent.txt.tera";

pub struct PromptBuilder {
    tera: Tera,
}

impl PromptBuilder {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(
            AGENT_TEMPLATE,
            include_str!("../../../templates/prompts/agent.txt.tera"),
        )
        .context("could not register the agent prompt template")?;
        Ok(Self { tera })
    }

    /// Renders the full prompt for one model call.
    pub fn render(
        &self,
        message: &str,
        history: &[ChatTurn],
        observations: &[ToolObservation],
    ) -> Result<String> {
        let tools: Vec<PromptTool> = ToolKind::ALL
            .into_iter()
            .map(|tool| PromptTool { name: tool.name(), description: tool.description() })
            .collect();
        let turns: Vec<PromptTurn> = history
            .iter()
            .map(|turn| PromptTurn { role: turn.role.label(), content: &turn.content })
            .collect();

        let mut context = Context::new();
        context.insert("tools", &tools);
        context.insert("history", &turns);
        context.insert("observations", observations);
        context.insert("input", message);
        self.tera.render(AGENT_TEMPLATE, &context).context("could not render the agent prompt")
    }
}

#[derive(Serialize)]
struct PromptTool {
    name: &'static str,
    description: &'static str,
}

/// History turn under its display label, the way the model saw prior turns.
#[derive(Serialize)]
struct PromptTurn<'a> {
    role: &'static str,
    content: &'a str,
}
