use sqlx::Row;

use ceiba_core::domain::tax::TaxLine;

use super::{parse_decimal, RepositoryError, TaxTemplateRepository};
use crate::DbPool;

pub struct SqlTaxTemplateRepository {
    pool: DbPool,
}

impl SqlTaxTemplateRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_tax_line(row: &sqlx::sqlite::SqliteRow) -> Result<TaxLine, RepositoryError> {
    let charge_type: String =
        row.try_get("charge_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let account_head: String =
        row.try_get("account_head").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let rate: String = row.try_get("rate").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(TaxLine { charge_type, account_head, rate: parse_decimal(&rate)? })
}

#[async_trait::async_trait]
impl TaxTemplateRepository for SqlTaxTemplateRepository {
    async fn default_template(&self) -> Result<Option<String>, RepositoryError> {
        let name: Option<String> = sqlx::query_scalar(
            "SELECT name FROM tax_templates WHERE is_default = 1 ORDER BY name LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(name)
    }

    async fn template_lines(&self, name: &str) -> Result<Option<Vec<TaxLine>>, RepositoryError> {
        let present: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tax_templates WHERE name = ?)")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        if present == 0 {
            return Ok(None);
        }

        let rows = sqlx::query(
            "SELECT charge_type, account_head, rate FROM tax_template_lines
             WHERE template_name = ? ORDER BY id",
        )
        .bind(name)
        .fetch_all(&self.pool)
        .await?;

        let mut lines = Vec::with_capacity(rows.len());
        for row in &rows {
            lines.push(row_to_tax_line(row)?);
        }
        Ok(Some(lines))
    }
}
