use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Canonical demo seeds and the contract `verify` checks them against.
const SEED_CUSTOMERS: &[SeedCustomer] = &[
    SeedCustomer {
        name: "Tiendas La Ceiba",
        group: "Commercial",
        kind: "Company",
        label: "customer-tiendas-la-ceiba",
    },
    SeedCustomer {
        name: "María López",
        group: "Individual",
        kind: "Individual",
        label: "customer-maria-lopez",
    },
];

const SEED_SUPPLIERS: &[SeedSupplier] = &[SeedSupplier {
    name: "Distribuidora El Quetzal",
    group: "Distributor",
    label: "supplier-el-quetzal",
}];

const SEED_ITEMS: &[SeedItem] = &[
    SeedItem {
        code: "LAPTOP-001",
        standard_rate: "5500",
        expected_stock: 8.0,
        label: "item-laptop",
        stock_label: "stock-laptop",
    },
    SeedItem {
        code: "MOUSE-USB",
        standard_rate: "85.50",
        expected_stock: 50.0,
        label: "item-mouse",
        stock_label: "stock-mouse",
    },
    SeedItem {
        code: "PAPEL-CARTA",
        standard_rate: "42",
        expected_stock: 200.0,
        label: "item-papel",
        stock_label: "stock-papel",
    },
];

const SEED_TAX_TEMPLATE: &str = "IVA 12% - Ventas";
const SEED_TAX_RATE: &str = "12";
const SEED_COMPANY: &str = "Ceiba Demo, S.A.";

const SEED_INVOICE_IDS: &[i64] = &[9001, 9002, 9003];
const SEED_PURCHASE_IDS: &[i64] = &[9001];
const SEED_STOCK_LEDGER_IDS: &[i64] = &[9001, 9002, 9003, 9004];

/// Demo dataset for the assistant's ERP backend.
///
/// Provides deterministic fixtures for:
/// 1. Master data the validators resolve against
/// 2. Stock and sale history behind the item-stats tool
/// 3. Submitted invoices behind both reporting periods
pub struct SeedDataset;

impl SeedDataset {
    /// SQL fixture content for the demo dataset.
    pub const SQL: &str = include_str!("../../../config/fixtures/seed_data.sql");

    /// Load the demo dataset into the database. Safe to run repeatedly.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;

        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            customers: SEED_CUSTOMERS.len(),
            suppliers: SEED_SUPPLIERS.len(),
            items: SEED_ITEMS.len(),
            submitted_invoices: SEED_INVOICE_IDS.len(),
        })
    }

    /// Verify that seed data exists and matches the contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for customer in SEED_CUSTOMERS {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM customers
                 WHERE customer_name = ?1 AND customer_group = ?2 AND customer_type = ?3)",
            )
            .bind(customer.name)
            .bind(customer.group)
            .bind(customer.kind)
            .fetch_one(pool)
            .await?;
            checks.push((customer.label, present == 1));
        }

        for supplier in SEED_SUPPLIERS {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM suppliers
                 WHERE supplier_name = ?1 AND supplier_group = ?2)",
            )
            .bind(supplier.name)
            .bind(supplier.group)
            .fetch_one(pool)
            .await?;
            checks.push((supplier.label, present == 1));
        }

        for item in SEED_ITEMS {
            let present: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM items
                 WHERE item_code = ?1 AND standard_rate = ?2)",
            )
            .bind(item.code)
            .bind(item.standard_rate)
            .fetch_one(pool)
            .await?;
            checks.push((item.label, present == 1));

            let balance: f64 = sqlx::query_scalar(
                "SELECT COALESCE(SUM(CAST(actual_qty AS REAL)), 0.0)
                 FROM stock_ledger WHERE item_code = ?1",
            )
            .bind(item.code)
            .fetch_one(pool)
            .await?;
            checks.push((item.stock_label, balance == item.expected_stock));
        }

        let default_template: Option<String> = sqlx::query_scalar(
            "SELECT name FROM tax_templates WHERE is_default = 1 ORDER BY name LIMIT 1",
        )
        .fetch_optional(pool)
        .await?;
        checks.push(("default-tax-template", default_template.as_deref() == Some(SEED_TAX_TEMPLATE)));

        let tax_rate_ok: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM tax_template_lines
             WHERE template_name = ?1 AND rate = ?2)",
        )
        .bind(SEED_TAX_TEMPLATE)
        .bind(SEED_TAX_RATE)
        .fetch_one(pool)
        .await?;
        checks.push(("tax-template-rate", tax_rate_ok == 1));

        let company_ok: i64 = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM company_settings WHERE company_name = ?1)",
        )
        .bind(SEED_COMPANY)
        .fetch_one(pool)
        .await?;
        checks.push(("company-settings", company_ok == 1));

        let submitted_count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(1) FROM sales_invoices
             WHERE id IN {} AND docstatus = 1",
            sql_array_from_ids(SEED_INVOICE_IDS)
        ))
        .fetch_one(pool)
        .await?;
        checks.push(("submitted-invoices", submitted_count == SEED_INVOICE_IDS.len() as i64));

        let last_laptop_rate: Option<String> = sqlx::query_scalar(
            "SELECT rate FROM sales_invoice_lines WHERE item_code = 'LAPTOP-001'
             ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(pool)
        .await?;
        checks.push(("laptop-last-sale-rate", last_laptop_rate.as_deref() == Some("5500")));

        let all_present = checks.iter().all(|(_, exists)| *exists);
        Ok(VerificationResult { all_present, checks })
    }

    /// Clean up seeded fixtures from a test database.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;

        let invoice_ids = sql_array_from_ids(SEED_INVOICE_IDS);
        let purchase_ids = sql_array_from_ids(SEED_PURCHASE_IDS);
        let ledger_ids = sql_array_from_ids(SEED_STOCK_LEDGER_IDS);

        sqlx::query(&format!("DELETE FROM sales_invoices WHERE id IN {invoice_ids}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("DELETE FROM purchase_invoices WHERE id IN {purchase_ids}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("DELETE FROM stock_ledger WHERE id IN {ledger_ids}"))
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM tax_templates WHERE name = ?")
            .bind(SEED_TAX_TEMPLATE)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM company_settings WHERE company_name = ?")
            .bind(SEED_COMPANY)
            .execute(&mut *tx)
            .await?;
        for customer in SEED_CUSTOMERS {
            sqlx::query("DELETE FROM customers WHERE customer_name = ?")
                .bind(customer.name)
                .execute(&mut *tx)
                .await?;
        }
        for supplier in SEED_SUPPLIERS {
            sqlx::query("DELETE FROM suppliers WHERE supplier_name = ?")
                .bind(supplier.name)
                .execute(&mut *tx)
                .await?;
        }
        for item in SEED_ITEMS {
            sqlx::query("DELETE FROM items WHERE item_code = ?")
                .bind(item.code)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct SeedCustomer {
    name: &'static str,
    group: &'static str,
    kind: &'static str,
    label: &'static str,
}

#[derive(Debug, Clone, Copy)]
struct SeedSupplier {
    name: &'static str,
    group: &'static str,
    label: &'static str,
}

#[derive(Debug, Clone, Copy)]
struct SeedItem {
    code: &'static str,
    standard_rate: &'static str,
    expected_stock: f64,
    label: &'static str,
    stock_label: &'static str,
}

fn sql_array_from_ids(ids: &[i64]) -> String {
    let joined = ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",");
    format!("({joined})")
}

#[derive(Debug)]
pub struct SeedResult {
    pub customers: usize,
    pub suppliers: usize,
    pub items: usize,
    pub submitted_invoices: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
