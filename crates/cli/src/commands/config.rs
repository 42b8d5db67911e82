use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ceiba_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let source = |key_path: &str, env_key: &str| {
        field_source(key_path, env_key, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "database.url",
        &config.database.url,
        source("database.url", "CEIBA_DATABASE_URL"),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        source("database.max_connections", "CEIBA_DATABASE_MAX_CONNECTIONS"),
    ));
    lines.push(render_line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        source("database.timeout_secs", "CEIBA_DATABASE_TIMEOUT_SECS"),
    ));

    lines.push(render_line(
        "llm.google_api_key",
        redact_secret(config.llm.google_api_key.expose_secret()),
        source("llm.google_api_key", "CEIBA_LLM_GOOGLE_API_KEY"),
    ));
    lines.push(render_line(
        "llm.base_url",
        &config.llm.base_url,
        source("llm.base_url", "CEIBA_LLM_BASE_URL"),
    ));
    lines.push(render_line("llm.model", &config.llm.model, source("llm.model", "CEIBA_LLM_MODEL")));
    lines.push(render_line(
        "llm.timeout_secs",
        &config.llm.timeout_secs.to_string(),
        source("llm.timeout_secs", "CEIBA_LLM_TIMEOUT_SECS"),
    ));
    lines.push(render_line(
        "llm.max_retries",
        &config.llm.max_retries.to_string(),
        source("llm.max_retries", "CEIBA_LLM_MAX_RETRIES"),
    ));

    lines.push(render_line(
        "memory.url",
        &config.memory.url,
        source("memory.url", "CEIBA_MEMORY_URL"),
    ));
    lines.push(render_line(
        "fiscal.base_url",
        &config.fiscal.base_url,
        source("fiscal.base_url", "CEIBA_FISCAL_BASE_URL"),
    ));
    lines.push(render_line(
        "translator.base_url",
        &config.translator.base_url,
        source("translator.base_url", "CEIBA_TRANSLATOR_BASE_URL"),
    ));
    lines.push(render_line(
        "company.name",
        &config.company.name,
        source("company.name", "CEIBA_COMPANY_NAME"),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        source("server.bind_address", "CEIBA_SERVER_BIND_ADDRESS"),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        source("server.port", "CEIBA_SERVER_PORT"),
    ));
    lines.push(render_line(
        "server.graceful_shutdown_secs",
        &config.server.graceful_shutdown_secs.to_string(),
        source("server.graceful_shutdown_secs", "CEIBA_SERVER_GRACEFUL_SHUTDOWN_SECS"),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        source("logging.level", "CEIBA_LOGGING_LEVEL"),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", "CEIBA_LOGGING_FORMAT"),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("ceiba.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/ceiba.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_secret(secret: &str) -> &'static str {
    if secret.trim().is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}
