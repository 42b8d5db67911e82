use sqlx::Row;

use ceiba_core::domain::customer::{Customer, CustomerFields};

use super::{parse_customer_type, CustomerRecord, CustomerRepository, RepositoryError};
use crate::DbPool;

pub struct SqlCustomerRepository {
    pool: DbPool,
}

impl SqlCustomerRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_customer(row: &sqlx::sqlite::SqliteRow) -> Result<CustomerRecord, RepositoryError> {
    let customer_name: String =
        row.try_get("customer_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let customer_group: String =
        row.try_get("customer_group").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let customer_type: String =
        row.try_get("customer_type").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(CustomerRecord {
        customer_name,
        customer_group,
        customer_type: parse_customer_type(&customer_type),
        created_at,
    })
}

#[async_trait::async_trait]
impl CustomerRepository for SqlCustomerRepository {
    async fn find(&self, name: &str) -> Result<Option<CustomerRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT customer_name, customer_group, customer_type, created_at
             FROM customers WHERE customer_name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_customer(r)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, customer: &Customer) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO customers (customer_name, customer_group, customer_type)
             VALUES (?, ?, ?)",
        )
        .bind(&customer.customer_name)
        .bind(&customer.customer_group)
        .bind(customer.customer_type.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update(&self, name: &str, fields: &CustomerFields) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE customers
             SET customer_group = COALESCE(?, customer_group),
                 customer_type = COALESCE(?, customer_type)
             WHERE customer_name = ?",
        )
        .bind(&fields.customer_group)
        .bind(fields.customer_type.map(|kind| kind.as_str()))
        .bind(name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, name: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM customers WHERE customer_name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
