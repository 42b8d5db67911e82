use std::sync::Arc;

use ceiba_agent::{
    local_today, AgentRuntime, GeminiClient, GoogleTranslator, RedisMemory, SatWebService, Toolbox,
};
use ceiba_core::config::{AppConfig, ConfigError, LoadOptions};
use ceiba_db::repositories::{
    SqlCompanyRepository, SqlCustomerRepository, SqlItemRepository, SqlPurchaseRepository,
    SqlSalesRepository, SqlSupplierRepository, SqlTaxTemplateRepository,
};
use ceiba_db::{connect_with_settings, migrations, DbPool};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("agent runtime assembly failed: {0}")]
    Runtime(#[source] anyhow::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let runtime = build_runtime(&config, db_pool.clone()).map_err(BootstrapError::Runtime)?;
    info!(
        event_name = "system.bootstrap.runtime_ready",
        correlation_id = "bootstrap",
        company = %config.company.name,
        model = %config.llm.model,
        "agent runtime assembled"
    );

    Ok(Application { config, db_pool, runtime: Arc::new(runtime) })
}

/// Wires the live edges (Gemini, Redis, the translator, the SAT bridge)
/// and the SQL-backed ERP repositories into one runtime.
fn build_runtime(config: &AppConfig, db_pool: DbPool) -> anyhow::Result<AgentRuntime> {
    let toolbox = Toolbox {
        customers: Arc::new(SqlCustomerRepository::new(db_pool.clone())),
        suppliers: Arc::new(SqlSupplierRepository::new(db_pool.clone())),
        items: Arc::new(SqlItemRepository::new(db_pool.clone())),
        tax_templates: Arc::new(SqlTaxTemplateRepository::new(db_pool.clone())),
        companies: Arc::new(SqlCompanyRepository::new(db_pool.clone())),
        sales: Arc::new(SqlSalesRepository::new(db_pool.clone())),
        purchases: Arc::new(SqlPurchaseRepository::new(db_pool)),
        fiscal: Arc::new(SatWebService::new(&config.fiscal)?),
        company: config.company.name.clone(),
        today: local_today,
    };

    AgentRuntime::new(
        Arc::new(GeminiClient::new(&config.llm)?),
        Arc::new(RedisMemory::new(&config.memory)?),
        Arc::new(GoogleTranslator::new(&config.translator)?),
        toolbox,
    )
}
