use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use ceiba_core::dates::DateRange;
use ceiba_core::domain::customer::{Customer, CustomerFields};
use ceiba_core::domain::item::Item;
use ceiba_core::domain::purchase::PurchaseInvoice;
use ceiba_core::domain::sales::{SalesInvoice, SalesOrder};
use ceiba_core::domain::supplier::Supplier;
use ceiba_core::domain::tax::TaxLine;

use super::{
    CompanyRepository, CustomerRecord, CustomerRepository, ItemRepository, PurchaseRepository,
    RepositoryError, SalesRepository, SupplierRepository, TaxTemplateRepository,
};

/// One store standing in for every repository trait. Agent tests wire a
/// single `Arc<InMemoryErp>` everywhere a repository is expected.
#[derive(Default)]
pub struct InMemoryErp {
    customers: RwLock<HashMap<String, CustomerRecord>>,
    suppliers: RwLock<HashMap<String, Supplier>>,
    items: RwLock<HashMap<String, Item>>,
    templates: RwLock<HashMap<String, Vec<TaxLine>>>,
    default_template: RwLock<Option<String>>,
    fel_companies: RwLock<HashSet<String>>,
    ledger: RwLock<Vec<(String, Decimal)>>,
    sale_lines: RwLock<Vec<(String, Decimal)>>,
    submitted_totals: RwLock<Vec<(NaiveDate, Decimal)>>,
    orders: RwLock<Vec<SalesOrder>>,
    invoices: RwLock<Vec<SalesInvoice>>,
    purchases: RwLock<Vec<PurchaseInvoice>>,
}

impl InMemoryErp {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_tax_template(&self, name: &str, lines: Vec<TaxLine>) {
        self.templates.write().await.insert(name.to_string(), lines);
    }

    pub async fn set_default_template(&self, name: &str) {
        *self.default_template.write().await = Some(name.to_string());
    }

    pub async fn enable_fel(&self, company: &str) {
        self.fel_companies.write().await.insert(company.to_string());
    }

    pub async fn push_ledger_entry(&self, item_code: &str, qty: Decimal) {
        self.ledger.write().await.push((item_code.to_string(), qty));
    }

    pub async fn push_sale_line(&self, item_code: &str, rate: Decimal) {
        self.sale_lines.write().await.push((item_code.to_string(), rate));
    }

    /// Records revenue the way a submitted invoice would, without going
    /// through the draft workflow.
    pub async fn push_submitted_invoice(&self, posting_date: NaiveDate, grand_total: Decimal) {
        self.submitted_totals.write().await.push((posting_date, grand_total));
    }

    pub async fn order_count(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn invoice_count(&self) -> usize {
        self.invoices.read().await.len()
    }

    pub async fn purchase_count(&self) -> usize {
        self.purchases.read().await.len()
    }

    pub async fn last_order(&self) -> Option<SalesOrder> {
        self.orders.read().await.last().cloned()
    }

    pub async fn last_invoice(&self) -> Option<SalesInvoice> {
        self.invoices.read().await.last().cloned()
    }

    pub async fn last_purchase(&self) -> Option<PurchaseInvoice> {
        self.purchases.read().await.last().cloned()
    }
}

#[async_trait::async_trait]
impl CustomerRepository for InMemoryErp {
    async fn find(&self, name: &str) -> Result<Option<CustomerRecord>, RepositoryError> {
        Ok(self.customers.read().await.get(name).cloned())
    }

    async fn insert(&self, customer: &Customer) -> Result<(), RepositoryError> {
        let record = CustomerRecord {
            customer_name: customer.customer_name.clone(),
            customer_group: customer.customer_group.clone(),
            customer_type: customer.customer_type,
            created_at: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        self.customers.write().await.insert(customer.customer_name.clone(), record);
        Ok(())
    }

    async fn update(&self, name: &str, fields: &CustomerFields) -> Result<bool, RepositoryError> {
        let mut customers = self.customers.write().await;
        let Some(record) = customers.get_mut(name) else {
            return Ok(false);
        };
        if let Some(group) = &fields.customer_group {
            record.customer_group = group.clone();
        }
        if let Some(kind) = fields.customer_type {
            record.customer_type = kind;
        }
        Ok(true)
    }

    async fn delete(&self, name: &str) -> Result<bool, RepositoryError> {
        Ok(self.customers.write().await.remove(name).is_some())
    }
}

#[async_trait::async_trait]
impl SupplierRepository for InMemoryErp {
    async fn insert(&self, supplier: &Supplier) -> Result<(), RepositoryError> {
        self.suppliers.write().await.insert(supplier.supplier_name.clone(), supplier.clone());
        Ok(())
    }
}

#[async_trait::async_trait]
impl ItemRepository for InMemoryErp {
    async fn exists(&self, item_code: &str) -> Result<bool, RepositoryError> {
        Ok(self.items.read().await.contains_key(item_code))
    }

    async fn insert(&self, item: &Item) -> Result<(), RepositoryError> {
        self.items.write().await.insert(item.item_code.clone(), item.clone());
        Ok(())
    }

    async fn stock_balance(&self, item_code: &str) -> Result<Decimal, RepositoryError> {
        let ledger = self.ledger.read().await;
        Ok(ledger.iter().filter(|(code, _)| code == item_code).map(|(_, qty)| *qty).sum())
    }

    async fn last_sale_rate(&self, item_code: &str) -> Result<Option<Decimal>, RepositoryError> {
        let lines = self.sale_lines.read().await;
        Ok(lines.iter().rev().find(|(code, _)| code == item_code).map(|(_, rate)| *rate))
    }
}

#[async_trait::async_trait]
impl TaxTemplateRepository for InMemoryErp {
    async fn default_template(&self) -> Result<Option<String>, RepositoryError> {
        Ok(self.default_template.read().await.clone())
    }

    async fn template_lines(&self, name: &str) -> Result<Option<Vec<TaxLine>>, RepositoryError> {
        Ok(self.templates.read().await.get(name).cloned())
    }
}

#[async_trait::async_trait]
impl CompanyRepository for InMemoryErp {
    async fn fel_required(&self, company: &str) -> Result<bool, RepositoryError> {
        Ok(self.fel_companies.read().await.contains(company))
    }
}

#[async_trait::async_trait]
impl SalesRepository for InMemoryErp {
    async fn insert_order(&self, order: &SalesOrder) -> Result<(), RepositoryError> {
        self.orders.write().await.push(order.clone());
        Ok(())
    }

    async fn insert_invoice(&self, invoice: &SalesInvoice) -> Result<(), RepositoryError> {
        let mut sale_lines = self.sale_lines.write().await;
        for item in &invoice.items {
            sale_lines.push((item.item_code.clone(), item.rate));
        }
        drop(sale_lines);
        self.invoices.write().await.push(invoice.clone());
        Ok(())
    }

    async fn total_sales_between(&self, range: &DateRange) -> Result<Decimal, RepositoryError> {
        let totals = self.submitted_totals.read().await;
        Ok(totals
            .iter()
            .filter(|(date, _)| range.contains(*date))
            .map(|(_, total)| *total)
            .sum())
    }
}

#[async_trait::async_trait]
impl PurchaseRepository for InMemoryErp {
    async fn insert_invoice(&self, invoice: &PurchaseInvoice) -> Result<(), RepositoryError> {
        self.purchases.write().await.push(invoice.clone());
        Ok(())
    }
}
