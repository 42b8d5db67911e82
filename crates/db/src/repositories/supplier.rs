use ceiba_core::domain::supplier::Supplier;

use super::{RepositoryError, SupplierRepository};
use crate::DbPool;

pub struct SqlSupplierRepository {
    pool: DbPool,
}

impl SqlSupplierRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SupplierRepository for SqlSupplierRepository {
    async fn insert(&self, supplier: &Supplier) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO suppliers (supplier_name, supplier_group)
             VALUES (?, ?)",
        )
        .bind(&supplier.supplier_name)
        .bind(&supplier.supplier_group)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
