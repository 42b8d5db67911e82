use rust_decimal::Decimal;
use sqlx::Row;

use ceiba_core::dates::DateRange;
use ceiba_core::domain::sales::{SalesInvoice, SalesOrder};
use ceiba_core::domain::tax::TaxLine;

use super::{parse_decimal, RepositoryError, SalesRepository};
use crate::DbPool;

pub struct SqlSalesRepository {
    pool: DbPool,
}

impl SqlSalesRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn insert_tax_lines(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    table: &str,
    parent_column: &str,
    parent_id: i64,
    lines: &[TaxLine],
) -> Result<(), RepositoryError> {
    for line in lines {
        let sql = format!(
            "INSERT INTO {table} ({parent_column}, charge_type, account_head, rate)
             VALUES (?, ?, ?, ?)"
        );
        sqlx::query(&sql)
            .bind(parent_id)
            .bind(&line.charge_type)
            .bind(&line.account_head)
            .bind(line.rate.to_string())
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

#[async_trait::async_trait]
impl SalesRepository for SqlSalesRepository {
    async fn insert_order(&self, order: &SalesOrder) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let header = sqlx::query(
            "INSERT INTO sales_orders
                 (customer, posting_date, delivery_date, cost_center, taxes_and_charges,
                  grand_total)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&order.customer)
        .bind(order.posting_date.to_string())
        .bind(order.delivery_date.to_string())
        .bind(&order.cost_center)
        .bind(&order.taxes.template)
        .bind(order.grand_total().to_string())
        .execute(&mut *tx)
        .await?;
        let order_id = header.last_insert_rowid();

        for item in &order.items {
            sqlx::query(
                "INSERT INTO sales_order_lines (order_id, item_code, qty, rate)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(order_id)
            .bind(&item.item_code)
            .bind(item.qty.to_string())
            .bind(item.rate.to_string())
            .execute(&mut *tx)
            .await?;
        }
        insert_tax_lines(&mut tx, "sales_order_taxes", "order_id", order_id, &order.taxes.lines)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn insert_invoice(&self, invoice: &SalesInvoice) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let header = sqlx::query(
            "INSERT INTO sales_invoices
                 (customer, posting_date, due_date, cost_center, update_stock, custom_fel,
                  id_identificacion, id_receptor, taxes_and_charges, grand_total)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&invoice.customer)
        .bind(invoice.posting_date.to_string())
        .bind(invoice.due_date.to_string())
        .bind(&invoice.cost_center)
        .bind(invoice.update_stock as i64)
        .bind(invoice.custom_fel as i64)
        .bind(invoice.receptor.as_ref().map(|r| r.id_type.as_str()))
        .bind(invoice.receptor.as_ref().map(|r| r.number.as_str()))
        .bind(&invoice.taxes.template)
        .bind(invoice.grand_total().to_string())
        .execute(&mut *tx)
        .await?;
        let invoice_id = header.last_insert_rowid();

        for item in &invoice.items {
            sqlx::query(
                "INSERT INTO sales_invoice_lines (invoice_id, item_code, qty, rate)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(invoice_id)
            .bind(&item.item_code)
            .bind(item.qty.to_string())
            .bind(item.rate.to_string())
            .execute(&mut *tx)
            .await?;
        }
        insert_tax_lines(
            &mut tx,
            "sales_invoice_taxes",
            "invoice_id",
            invoice_id,
            &invoice.taxes.lines,
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn total_sales_between(&self, range: &DateRange) -> Result<Decimal, RepositoryError> {
        let rows = sqlx::query(
            "SELECT grand_total FROM sales_invoices
             WHERE posting_date BETWEEN ? AND ? AND docstatus = 1",
        )
        .bind(range.start.to_string())
        .bind(range.end.to_string())
        .fetch_all(&self.pool)
        .await?;

        let mut total = Decimal::ZERO;
        for row in &rows {
            let grand_total: String = row.try_get("grand_total")?;
            total += parse_decimal(&grand_total)?;
        }
        Ok(total)
    }
}
