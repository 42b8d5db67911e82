use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use ceiba_core::dates::DateRange;
use ceiba_core::domain::customer::{Customer, CustomerFields, CustomerType};
use ceiba_core::domain::item::Item;
use ceiba_core::domain::purchase::PurchaseInvoice;
use ceiba_core::domain::sales::{SalesInvoice, SalesOrder};
use ceiba_core::domain::supplier::Supplier;
use ceiba_core::domain::tax::TaxLine;

pub mod company;
pub mod customer;
pub mod item;
pub mod memory;
pub mod purchase;
pub mod sales;
pub mod supplier;
pub mod tax;

pub use company::SqlCompanyRepository;
pub use customer::SqlCustomerRepository;
pub use item::SqlItemRepository;
pub use memory::InMemoryErp;
pub use purchase::SqlPurchaseRepository;
pub use sales::SqlSalesRepository;
pub use supplier::SqlSupplierRepository;
pub use tax::SqlTaxTemplateRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Customer as stored, including bookkeeping columns. This is the shape the
/// info tool serializes back to the agent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomerRecord {
    pub customer_name: String,
    pub customer_group: String,
    pub customer_type: CustomerType,
    pub created_at: String,
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn find(&self, name: &str) -> Result<Option<CustomerRecord>, RepositoryError>;
    async fn insert(&self, customer: &Customer) -> Result<(), RepositoryError>;
    /// Returns false when no customer carries that name.
    async fn update(&self, name: &str, fields: &CustomerFields) -> Result<bool, RepositoryError>;
    /// Returns false when no customer carries that name.
    async fn delete(&self, name: &str) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait SupplierRepository: Send + Sync {
    async fn insert(&self, supplier: &Supplier) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn exists(&self, code: &str) -> Result<bool, RepositoryError>;
    async fn insert(&self, item: &Item) -> Result<(), RepositoryError>;
    /// Sum of all ledger movements for the item.
    async fn stock_balance(&self, code: &str) -> Result<Decimal, RepositoryError>;
    /// Rate on the most recently recorded sale line, if the item was ever sold.
    async fn last_sale_rate(&self, code: &str) -> Result<Option<Decimal>, RepositoryError>;
}

#[async_trait]
pub trait TaxTemplateRepository: Send + Sync {
    async fn default_template(&self) -> Result<Option<String>, RepositoryError>;
    /// `None` when no template carries that name.
    async fn template_lines(&self, name: &str) -> Result<Option<Vec<TaxLine>>, RepositoryError>;
}

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    /// Whether the named company is configured to emit electronic invoices.
    /// Companies without a settings row are not.
    async fn fel_required(&self, company: &str) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait SalesRepository: Send + Sync {
    async fn insert_order(&self, order: &SalesOrder) -> Result<(), RepositoryError>;
    async fn insert_invoice(&self, invoice: &SalesInvoice) -> Result<(), RepositoryError>;
    /// Sum of grand totals of submitted invoices posted inside the range.
    async fn total_sales_between(&self, range: &DateRange) -> Result<Decimal, RepositoryError>;
}

#[async_trait]
pub trait PurchaseRepository: Send + Sync {
    async fn insert_invoice(&self, invoice: &PurchaseInvoice) -> Result<(), RepositoryError>;
}

pub(crate) fn parse_decimal(raw: &str) -> Result<Decimal, RepositoryError> {
    raw.trim()
        .parse()
        .map_err(|_| RepositoryError::Decode(format!("invalid decimal value `{raw}`")))
}

pub(crate) fn parse_customer_type(label: &str) -> CustomerType {
    match label {
        "Company" => CustomerType::Company,
        _ => CustomerType::Individual,
    }
}
