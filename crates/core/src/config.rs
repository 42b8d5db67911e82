use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub llm: LlmConfig,
    pub memory: MemoryConfig,
    pub fiscal: FiscalConfig,
    pub translator: TranslatorConfig,
    pub company: CompanyConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub google_api_key: SecretString,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Conversation history store (Redis).
#[derive(Clone, Debug)]
pub struct MemoryConfig {
    pub url: String,
}

/// Taxpayer-registry bridge used by the SAT lookup tool.
#[derive(Clone, Debug)]
pub struct FiscalConfig {
    pub base_url: String,
}

#[derive(Clone, Debug)]
pub struct TranslatorConfig {
    pub base_url: String,
}

/// Company the assistant writes documents for. Its settings row decides
/// whether electronic invoicing is mandatory.
#[derive(Clone, Debug)]
pub struct CompanyConfig {
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub google_api_key: Option<String>,
    pub llm_model: Option<String>,
    pub memory_url: Option<String>,
    pub company_name: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://ceiba.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            llm: LlmConfig {
                google_api_key: String::new().into(),
                base_url: "https://generativelanguage.googleapis.com".to_string(),
                model: "models/gemma-3-27b-it".to_string(),
                timeout_secs: 30,
                max_retries: 2,
            },
            memory: MemoryConfig { url: "redis://localhost:6379/0".to_string() },
            fiscal: FiscalConfig { base_url: "http://localhost:8085".to_string() },
            translator: TranslatorConfig {
                base_url: "https://translate.googleapis.com".to_string(),
            },
            company: CompanyConfig { name: "Ceiba Demo, S.A.".to_string() },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("ceiba.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(google_api_key_value) = llm.google_api_key {
                self.llm.google_api_key = secret_value(google_api_key_value);
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = llm.max_retries {
                self.llm.max_retries = max_retries;
            }
        }

        if let Some(memory) = patch.memory {
            if let Some(url) = memory.url {
                self.memory.url = url;
            }
        }

        if let Some(fiscal) = patch.fiscal {
            if let Some(base_url) = fiscal.base_url {
                self.fiscal.base_url = base_url;
            }
        }

        if let Some(translator) = patch.translator {
            if let Some(base_url) = translator.base_url {
                self.translator.base_url = base_url;
            }
        }

        if let Some(company) = patch.company {
            if let Some(name) = company.name {
                self.company.name = name;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CEIBA_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("CEIBA_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("CEIBA_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("CEIBA_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("CEIBA_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CEIBA_LLM_GOOGLE_API_KEY") {
            self.llm.google_api_key = secret_value(value);
        }
        if let Some(value) = read_env("CEIBA_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("CEIBA_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("CEIBA_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("CEIBA_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("CEIBA_LLM_MAX_RETRIES") {
            self.llm.max_retries = parse_u32("CEIBA_LLM_MAX_RETRIES", &value)?;
        }

        if let Some(value) = read_env("CEIBA_MEMORY_URL") {
            self.memory.url = value;
        }
        if let Some(value) = read_env("CEIBA_FISCAL_BASE_URL") {
            self.fiscal.base_url = value;
        }
        if let Some(value) = read_env("CEIBA_TRANSLATOR_BASE_URL") {
            self.translator.base_url = value;
        }
        if let Some(value) = read_env("CEIBA_COMPANY_NAME") {
            self.company.name = value;
        }

        if let Some(value) = read_env("CEIBA_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("CEIBA_SERVER_PORT") {
            self.server.port = parse_u16("CEIBA_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("CEIBA_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("CEIBA_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("CEIBA_LOGGING_LEVEL").or_else(|| read_env("CEIBA_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("CEIBA_LOGGING_FORMAT").or_else(|| read_env("CEIBA_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(google_api_key) = overrides.google_api_key {
            self.llm.google_api_key = secret_value(google_api_key);
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(memory_url) = overrides.memory_url {
            self.memory.url = memory_url;
        }
        if let Some(company_name) = overrides.company_name {
            self.company.name = company_name;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_llm(&self.llm)?;
        validate_memory(&self.memory)?;
        validate_base_url("fiscal.base_url", &self.fiscal.base_url)?;
        validate_base_url("translator.base_url", &self.translator.base_url)?;
        validate_company(&self.company)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("ceiba.toml"), PathBuf::from("config/ceiba.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.google_api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "llm.google_api_key is required. Get one from https://aistudio.google.com/app/apikey and set it in ceiba.toml or CEIBA_LLM_GOOGLE_API_KEY".to_string()
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    validate_base_url("llm.base_url", &llm.base_url)
}

fn validate_memory(memory: &MemoryConfig) -> Result<(), ConfigError> {
    let url = memory.url.trim();
    if !url.starts_with("redis://") && !url.starts_with("rediss://") {
        return Err(ConfigError::Validation(
            "memory.url must be a redis URL (`redis://...` or `rediss://...`)".to_string(),
        ));
    }
    Ok(())
}

fn validate_company(company: &CompanyConfig) -> Result<(), ConfigError> {
    if company.name.trim().is_empty() {
        return Err(ConfigError::Validation("company.name must not be empty".to_string()));
    }
    Ok(())
}

fn validate_base_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = value.trim();
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{key} must start with http:// or https://"
        )));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    llm: Option<LlmPatch>,
    memory: Option<MemoryPatch>,
    fiscal: Option<FiscalPatch>,
    translator: Option<TranslatorPatch>,
    company: Option<CompanyPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    google_api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct MemoryPatch {
    url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FiscalPatch {
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TranslatorPatch {
    base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CompanyPatch {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
