use serde_json::Value;

/// What the model asked for in one loop step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentStep {
    /// Call the named tool with the given argument string.
    Action { tool: String, input: String },
    /// Answer the user and stop.
    Final(String),
}

/// Reads a completion as a directive.
///
/// The prompt asks for a bare JSON object, but models wrap it in code fences
/// or ignore the format outright often enough that both get a lane: fences
/// are stripped before parsing, and anything that is not a directive object
/// is taken as a final answer verbatim.
pub fn parse_directive(completion: &str) -> AgentStep {
    let candidate = strip_code_fence(completion);
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(candidate) {
        if let Some(tool) = fields.get("action").and_then(Value::as_str) {
            let input = match fields.get("action_input") {
                Some(Value::String(text)) => text.clone(),
                Some(Value::Null) | None => String::new(),
                Some(other) => other.to_string(),
            };
            return AgentStep::Action { tool: tool.to_string(), input };
        }
        if let Some(answer) = fields.get("final_answer") {
            let text = match answer {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            return AgentStep::Final(text);
        }
    }
    AgentStep::Final(completion.trim().to_string())
}

fn strip_code_fence(completion: &str) -> &str {
    let trimmed = completion.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    body.trim().trim_end_matches("```").trim()
}
