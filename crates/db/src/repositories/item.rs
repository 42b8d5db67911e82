use rust_decimal::Decimal;
use sqlx::Row;

use ceiba_core::domain::item::Item;

use super::{parse_decimal, ItemRepository, RepositoryError};
use crate::DbPool;

pub struct SqlItemRepository {
    pool: DbPool,
}

impl SqlItemRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ItemRepository for SqlItemRepository {
    async fn exists(&self, item_code: &str) -> Result<bool, RepositoryError> {
        let present: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM items WHERE item_code = ?)")
                .bind(item_code)
                .fetch_one(&self.pool)
                .await?;

        Ok(present != 0)
    }

    async fn insert(&self, item: &Item) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO items (item_code, item_group, stock_uom, standard_rate)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&item.item_code)
        .bind(&item.item_group)
        .bind(&item.stock_uom)
        .bind(item.standard_rate.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn stock_balance(&self, item_code: &str) -> Result<Decimal, RepositoryError> {
        let rows = sqlx::query("SELECT actual_qty FROM stock_ledger WHERE item_code = ?")
            .bind(item_code)
            .fetch_all(&self.pool)
            .await?;

        let mut balance = Decimal::ZERO;
        for row in &rows {
            let qty: String =
                row.try_get("actual_qty").map_err(|e| RepositoryError::Decode(e.to_string()))?;
            balance += parse_decimal(&qty)?;
        }
        Ok(balance)
    }

    async fn last_sale_rate(&self, item_code: &str) -> Result<Option<Decimal>, RepositoryError> {
        let row = sqlx::query(
            "SELECT rate FROM sales_invoice_lines WHERE item_code = ?
             ORDER BY id DESC LIMIT 1",
        )
        .bind(item_code)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => {
                let rate: String =
                    r.try_get("rate").map_err(|e| RepositoryError::Decode(e.to_string()))?;
                Ok(Some(parse_decimal(&rate)?))
            }
            None => Ok(None),
        }
    }
}
