use ceiba_core::domain::purchase::PurchaseInvoice;

use super::{PurchaseRepository, RepositoryError};
use crate::DbPool;

pub struct SqlPurchaseRepository {
    pool: DbPool,
}

impl SqlPurchaseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PurchaseRepository for SqlPurchaseRepository {
    async fn insert_invoice(&self, invoice: &PurchaseInvoice) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let header = sqlx::query(
            "INSERT INTO purchase_invoices (supplier, bill_date, due_date, update_stock,
                  grand_total)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&invoice.supplier)
        .bind(invoice.bill_date.to_string())
        .bind(invoice.due_date.to_string())
        .bind(invoice.update_stock as i64)
        .bind(invoice.grand_total().to_string())
        .execute(&mut *tx)
        .await?;
        let invoice_id = header.last_insert_rowid();

        for item in &invoice.items {
            sqlx::query(
                "INSERT INTO purchase_invoice_lines (invoice_id, item_code, qty, rate)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(invoice_id)
            .bind(&item.item_code)
            .bind(item.qty.to_string())
            .bind(item.rate.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
