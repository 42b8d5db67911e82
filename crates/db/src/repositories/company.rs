use super::{CompanyRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCompanyRepository {
    pool: DbPool,
}

impl SqlCompanyRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CompanyRepository for SqlCompanyRepository {
    async fn fel_required(&self, company: &str) -> Result<bool, RepositoryError> {
        let flag: Option<i64> =
            sqlx::query_scalar("SELECT fel_required FROM company_settings WHERE company_name = ?")
                .bind(company)
                .fetch_optional(&self.pool)
                .await?;

        Ok(flag.unwrap_or(0) != 0)
    }
}
