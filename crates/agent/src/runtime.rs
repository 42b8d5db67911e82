//! The conversation loop that ties the pieces together.
//!
//! One `respond` call runs the whole turn: the topic gate, the prompt/model/
//! directive loop with tool dispatch, the Spanish guarantee on the final
//! answer, and the history write. Only infrastructure failures surface as
//! errors; everything a user or model can get wrong is answered in-band.

use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::{info, instrument, warn};

use crate::directive::{parse_directive, AgentStep};
use crate::gate::{is_erp_related, OFF_TOPIC_REPLY};
use crate::language::{ensure_spanish, Translator};
use crate::llm::LlmClient;
use crate::memory::{ChatTurn, ConversationMemory};
use crate::prompt::PromptBuilder;
use crate::tools::{ToolKind, ToolObservation, Toolbox};

/// Tool calls allowed per user message before the loop gives up.
pub const DEFAULT_MAX_STEPS: usize = 6;

pub struct AgentRuntime {
    llm: Arc<dyn LlmClient>,
    memory: Arc<dyn ConversationMemory>,
    translator: Arc<dyn Translator>,
    toolbox: Toolbox,
    prompts: PromptBuilder,
    max_steps: usize,
}

impl AgentRuntime {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        memory: Arc<dyn ConversationMemory>,
        translator: Arc<dyn Translator>,
        toolbox: Toolbox,
    ) -> Result<Self> {
        Ok(Self {
            llm,
            memory,
            translator,
            toolbox,
            prompts: PromptBuilder::new()?,
            max_steps: DEFAULT_MAX_STEPS,
        })
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Answers one user message inside a session.
    #[instrument(skip_all, fields(session = %session_id))]
    pub async fn respond(&self, session_id: &str, message: &str) -> Result<String> {
        if !is_erp_related(message) {
            info!("message refused by the topic gate");
            return Ok(OFF_TOPIC_REPLY.to_string());
        }

        let history = self.memory.history(session_id).await?;
        let mut observations: Vec<ToolObservation> = Vec::new();

        for _ in 0..self.max_steps {
            let prompt = self.prompts.render(message, &history, &observations)?;
            let completion = self.llm.complete(&prompt).await?;
            match parse_directive(&completion) {
                AgentStep::Action { tool, input } => {
                    let result = match ToolKind::from_name(&tool) {
                        Some(kind) => self.toolbox.dispatch(kind, &input).await,
                        None => {
                            warn!(tool = %tool, "model asked for a tool outside the set");
                            format!("failed: Unknown tool '{tool}'.")
                        }
                    };
                    observations.push(ToolObservation { tool, result });
                }
                AgentStep::Final(answer) => {
                    let reply = ensure_spanish(self.translator.as_ref(), &answer).await;
                    self.memory
                        .append(
                            session_id,
                            &[ChatTurn::human(message), ChatTurn::ai(reply.as_str())],
                        )
                        .await?;
                    return Ok(reply);
                }
            }
        }
        bail!("agent exceeded {} reasoning steps without a final answer", self.max_steps)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use chrono::NaiveDate;

    use ceiba_db::repositories::{CustomerRepository, InMemoryErp};

    use super::AgentRuntime;
    use crate::fiscal::FiscalLookup;
    use crate::gate::OFF_TOPIC_REPLY;
    use crate::language::Translator;
    use crate::llm::LlmClient;
    use crate::memory::{ChatRole, ChatTurn, ConversationMemory, InMemoryConversation};
    use crate::tools::Toolbox;

    struct FakeLlm {
        scripted: Mutex<VecDeque<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeLlm {
        fn scripted(replies: &[&str]) -> Self {
            Self {
                scripted: Mutex::new(replies.iter().map(|reply| reply.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for FakeLlm {
        async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
            self.prompts.lock().expect("lock").push(prompt.to_string());
            self.scripted
                .lock()
                .expect("lock")
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("no scripted completion left"))
        }
    }

    struct EchoTranslator;

    #[async_trait::async_trait]
    impl Translator for EchoTranslator {
        async fn translate_to_spanish(&self, text: &str) -> anyhow::Result<String> {
            Ok(format!("(es) {text}"))
        }
    }

    struct FakeSat;

    #[async_trait::async_trait]
    impl FiscalLookup for FakeSat {
        async fn lookup_nit(&self, nit: &str) -> anyhow::Result<String> {
            Ok(format!("NIT {nit}"))
        }

        async fn lookup_cui(&self, cui: &str) -> anyhow::Result<String> {
            Ok(format!("CUI {cui}"))
        }
    }

    fn toolbox(store: &Arc<InMemoryErp>) -> Toolbox {
        Toolbox {
            customers: store.clone(),
            suppliers: store.clone(),
            items: store.clone(),
            tax_templates: store.clone(),
            companies: store.clone(),
            sales: store.clone(),
            purchases: store.clone(),
            fiscal: Arc::new(FakeSat),
            company: "Ceiba Demo, S.A.".to_string(),
            today: || NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date"),
        }
    }

    fn runtime(
        llm: Arc<FakeLlm>,
        store: &Arc<InMemoryErp>,
    ) -> (AgentRuntime, Arc<InMemoryConversation>) {
        let memory = Arc::new(InMemoryConversation::new());
        let runtime =
            AgentRuntime::new(llm, memory.clone(), Arc::new(EchoTranslator), toolbox(store))
                .expect("runtime builds");
        (runtime, memory)
    }

    #[tokio::test]
    async fn off_topic_messages_are_refused_without_a_model_call() {
        let store = Arc::new(InMemoryErp::new());
        let llm = Arc::new(FakeLlm::scripted(&[]));
        let (runtime, memory) = runtime(llm.clone(), &store);

        let reply = runtime.respond("s1", "what's the weather today").await.expect("responds");
        assert_eq!(reply, OFF_TOPIC_REPLY);
        assert!(llm.prompts.lock().expect("lock").is_empty());
        assert!(memory.history("s1").await.expect("history").is_empty());
    }

    #[tokio::test]
    async fn tool_directives_execute_before_the_final_answer() {
        let store = Arc::new(InMemoryErp::new());
        let llm = Arc::new(FakeLlm::scripted(&[
            r#"{"action": "create_customer", "action_input": "{\"customer_name\": \"Acme Corp\", \"customer_group\": \"Commercial\"}"}"#,
            r#"{"final_answer": "El cliente Acme Corp quedó registrado correctamente en el sistema."}"#,
        ]));
        let (runtime, memory) = runtime(llm.clone(), &store);

        let reply =
            runtime.respond("s1", "hola, necesito crear un cliente").await.expect("responds");
        assert_eq!(reply, "El cliente Acme Corp quedó registrado correctamente en el sistema.");

        let record = store.find("Acme Corp").await.expect("find").expect("stored");
        assert_eq!(record.customer_group, "Commercial");

        let history = memory.history("s1").await.expect("history");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0], ChatTurn::human("hola, necesito crear un cliente"));
        assert_eq!(history[1].role, ChatRole::Ai);

        let prompts = llm.prompts.lock().expect("lock");
        assert_eq!(prompts.len(), 2);
        assert!(prompts[1].contains("- create_customer => done"));
    }

    #[tokio::test]
    async fn unknown_tools_become_failed_observations() {
        let store = Arc::new(InMemoryErp::new());
        let llm = Arc::new(FakeLlm::scripted(&[
            r#"{"action": "send_email", "action_input": "hola"}"#,
            r#"{"final_answer": "No puedo enviar correos, solo operar el sistema."}"#,
        ]));
        let (runtime, _memory) = runtime(llm.clone(), &store);

        let reply = runtime.respond("s1", "hola, ayuda con el sistema").await.expect("responds");
        assert_eq!(reply, "No puedo enviar correos, solo operar el sistema.");

        let prompts = llm.prompts.lock().expect("lock");
        assert!(prompts[1].contains("- send_email => failed: Unknown tool 'send_email'."));
    }

    #[tokio::test]
    async fn prior_turns_render_into_the_next_prompt() {
        let store = Arc::new(InMemoryErp::new());
        let llm = Arc::new(FakeLlm::scripted(&[
            r#"{"final_answer": "Claro, aquí tienes la información del sistema."}"#,
        ]));
        let (runtime, memory) = runtime(llm.clone(), &store);
        memory
            .append("s1", &[ChatTurn::human("hola"), ChatTurn::ai("¿En qué puedo ayudarte?")])
            .await
            .expect("seed history");

        runtime.respond("s1", "dame informacion del sistema").await.expect("responds");

        let prompts = llm.prompts.lock().expect("lock");
        assert!(prompts[0].contains("Human: hola\n"));
        assert!(prompts[0].contains("AI: ¿En qué puedo ayudarte?\n"));
        assert!(prompts[0].trim_end().ends_with("Human: dame informacion del sistema\nAI:"));
    }

    #[tokio::test]
    async fn english_answers_are_translated_before_storage() {
        let store = Arc::new(InMemoryErp::new());
        let llm = Arc::new(FakeLlm::scripted(&[
            r#"{"final_answer": "The customer was created successfully and is now available in the system."}"#,
        ]));
        let (runtime, memory) = runtime(llm.clone(), &store);

        let reply = runtime.respond("s1", "hola, crea el cliente").await.expect("responds");
        assert_eq!(
            reply,
            "(es) The customer was created successfully and is now available in the system."
        );

        let history = memory.history("s1").await.expect("history");
        assert_eq!(history[1], ChatTurn::ai(reply.as_str()));
    }

    #[tokio::test]
    async fn the_loop_gives_up_after_the_step_limit() {
        let store = Arc::new(InMemoryErp::new());
        let action = r#"{"action": "get_sales_stats", "action_input": "last_month"}"#;
        let llm = Arc::new(FakeLlm::scripted(&[action, action, action]));
        let (runtime, _memory) = runtime(llm.clone(), &store);
        let runtime = runtime.with_max_steps(3);

        let error = runtime.respond("s1", "hola, ventas").await.expect_err("limit exhausted");
        assert!(error.to_string().contains("3 reasoning steps"));
        assert_eq!(llm.prompts.lock().expect("lock").len(), 3);
    }
}
