//! The closed set of tools the agent may call, and their dispatch.
//!
//! Every tool takes a raw argument string and answers with a plain string:
//! `done` for writes, a JSON document for reads, or a reason prefixed with
//! `failed: ` when the call could not be honored. The model never sees a
//! Rust error; whatever goes wrong inside a tool is flattened to that
//! contract at the dispatch boundary.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, instrument};

use ceiba_core::dates::SalesPeriod;
use ceiba_core::domain::item::ItemStats;
use ceiba_core::domain::tax::{ResolvedTaxes, TaxPlan};
use ceiba_core::errors::ToolError;
use ceiba_core::payload::Payload;
use ceiba_core::validate::{
    parse_customer_update, parse_new_customer, parse_new_item, parse_new_supplier,
    parse_purchase_invoice, parse_sales_invoice, parse_sales_order, SalesInvoiceContext,
    SalesOrderContext,
};
use ceiba_db::repositories::{
    CompanyRepository, CustomerRepository, ItemRepository, PurchaseRepository, SalesRepository,
    SupplierRepository, TaxTemplateRepository,
};

use crate::fiscal::{consultar_identificacion, FiscalLookup};

/// Reply of every successful write tool.
pub const DONE: &str = "done";

/// Everything the agent is allowed to do. The prompt advertises exactly this
/// set, and dispatch refuses names outside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolKind {
    CreateCustomer,
    UpdateCustomer,
    DeleteCustomer,
    GetCustomerInfo,
    CreateSupplier,
    CreateItem,
    CreateSalesOrder,
    CreateSalesInvoice,
    CreatePurchaseInvoice,
    GetItemStats,
    GetSalesStats,
    ConsultarIdentificacionSat,
}

impl ToolKind {
    pub const ALL: [ToolKind; 12] = [
        ToolKind::CreateCustomer,
        ToolKind::UpdateCustomer,
        ToolKind::DeleteCustomer,
        ToolKind::GetCustomerInfo,
        ToolKind::CreateSupplier,
        ToolKind::CreateItem,
        ToolKind::CreateSalesOrder,
        ToolKind::CreateSalesInvoice,
        ToolKind::CreatePurchaseInvoice,
        ToolKind::GetItemStats,
        ToolKind::GetSalesStats,
        ToolKind::ConsultarIdentificacionSat,
    ];

    /// Wire name the model uses in its `action` directives.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateCustomer => "create_customer",
            Self::UpdateCustomer => "update_customers",
            Self::DeleteCustomer => "delete_customers",
            Self::GetCustomerInfo => "get_info_customer",
            Self::CreateSupplier => "create_suppliers",
            Self::CreateItem => "create_item",
            Self::CreateSalesOrder => "create_sales_order",
            Self::CreateSalesInvoice => "create_sales_invoice",
            Self::CreatePurchaseInvoice => "create_purchase_invoice",
            Self::GetItemStats => "get_item_stats",
            Self::GetSalesStats => "get_sales_stats",
            Self::ConsultarIdentificacionSat => "consultar_identificacion_sat",
        }
    }

    /// One-line summary rendered into the system prompt.
    pub fn description(&self) -> &'static str {
        match self {
            Self::CreateCustomer => {
                "Create a new Customer. Input: JSON with customer_name, customer_group, \
                 and optional customer_type."
            }
            Self::UpdateCustomer => {
                "Update an existing Customer. Input: JSON with customer_name and fields_to_update."
            }
            Self::DeleteCustomer => "Delete an existing Customer. Input: the customer name.",
            Self::GetCustomerInfo => {
                "Get information about an existing Customer. Input: the customer name."
            }
            Self::CreateSupplier => {
                "Create a new Supplier. Input: JSON with supplier_name and supplier_group."
            }
            Self::CreateItem => {
                "Create a new Item. Input: JSON with item_code, item_group, stock_uom, \
                 and optional standard_rate."
            }
            Self::CreateSalesOrder => {
                "Create a new Sales Order. Input: JSON with customer, items, and optional taxes."
            }
            Self::CreateSalesInvoice => {
                "Create a new Sales Invoice. Input: JSON with customer, items, and the \
                 id_identificacion/id_receptor_ pair when the company emits FEL."
            }
            Self::CreatePurchaseInvoice => {
                "Create a new Purchase Invoice. Input: JSON with supplier and items."
            }
            Self::GetItemStats => {
                "Get stock and price statistics for an item. Input: the item code."
            }
            Self::GetSalesStats => {
                "Get total sales for a period. Input: 'last_month' or 'this_year'."
            }
            Self::ConsultarIdentificacionSat => {
                "Consulta el nombre de un cliente en el SAT de Guatemala utilizando su NIT o CUI."
            }
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }
}

/// One executed tool call, fed back into the next prompt.
#[derive(Clone, Debug, Serialize)]
pub struct ToolObservation {
    pub tool: String,
    pub result: String,
}

/// Repositories and lookups behind the tool set, plus the identity and the
/// clock the documents are posted under.
pub struct Toolbox {
    pub customers: Arc<dyn CustomerRepository>,
    pub suppliers: Arc<dyn SupplierRepository>,
    pub items: Arc<dyn ItemRepository>,
    pub tax_templates: Arc<dyn TaxTemplateRepository>,
    pub companies: Arc<dyn CompanyRepository>,
    pub sales: Arc<dyn SalesRepository>,
    pub purchases: Arc<dyn PurchaseRepository>,
    pub fiscal: Arc<dyn FiscalLookup>,
    /// Company the assistant posts documents for; decides whether invoices
    /// need FEL identification.
    pub company: String,
    /// Posting-date clock, swappable in tests.
    pub today: fn() -> NaiveDate,
}

/// Default clock for [`Toolbox::today`].
pub fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

impl Toolbox {
    /// Runs one tool call and flattens the outcome to the observation
    /// contract. The SAT lookup formats its own errors, so it bypasses the
    /// `failed: ` boundary.
    #[instrument(skip_all, fields(tool = tool.name()))]
    pub async fn dispatch(&self, tool: ToolKind, input: &str) -> String {
        let outcome = match tool {
            ToolKind::CreateCustomer => self.create_customer(input).await,
            ToolKind::UpdateCustomer => self.update_customer(input).await,
            ToolKind::DeleteCustomer => self.delete_customer(input).await,
            ToolKind::GetCustomerInfo => self.customer_info(input).await,
            ToolKind::CreateSupplier => self.create_supplier(input).await,
            ToolKind::CreateItem => self.create_item(input).await,
            ToolKind::CreateSalesOrder => self.create_sales_order(input).await,
            ToolKind::CreateSalesInvoice => self.create_sales_invoice(input).await,
            ToolKind::CreatePurchaseInvoice => self.create_purchase_invoice(input).await,
            ToolKind::GetItemStats => self.item_stats(input).await,
            ToolKind::GetSalesStats => self.sales_stats(input).await,
            ToolKind::ConsultarIdentificacionSat => {
                Ok(consultar_identificacion(self.fiscal.as_ref(), &scalar(input)).await)
            }
        };
        match outcome {
            Ok(reply) => reply,
            Err(error) => {
                error!(%error, "tool call failed");
                format!("failed: {error}")
            }
        }
    }

    async fn create_customer(&self, input: &str) -> Result<String, ToolError> {
        let payload = Payload::parse(input)?;
        let customer = parse_new_customer(&payload)?;
        self.customers.insert(&customer).await.map_err(ToolError::backend)?;
        Ok(DONE.to_string())
    }

    async fn update_customer(&self, input: &str) -> Result<String, ToolError> {
        let payload = Payload::parse(input)?;
        let update = parse_customer_update(&payload)?;
        let found = self
            .customers
            .update(&update.customer_name, &update.fields)
            .await
            .map_err(ToolError::backend)?;
        if !found {
            return Err(ToolError::not_found("Customer", update.customer_name));
        }
        Ok(DONE.to_string())
    }

    async fn delete_customer(&self, input: &str) -> Result<String, ToolError> {
        let name = scalar(input);
        if !self.customers.delete(&name).await.map_err(ToolError::backend)? {
            return Err(ToolError::not_found("Customer", name));
        }
        Ok(DONE.to_string())
    }

    async fn customer_info(&self, input: &str) -> Result<String, ToolError> {
        let name = scalar(input);
        let record = self
            .customers
            .find(&name)
            .await
            .map_err(ToolError::backend)?
            .ok_or_else(|| ToolError::not_found("Customer", name))?;
        serde_json::to_string(&record).map_err(ToolError::backend)
    }

    async fn create_supplier(&self, input: &str) -> Result<String, ToolError> {
        let payload = Payload::parse(input)?;
        let supplier = parse_new_supplier(&payload)?;
        self.suppliers.insert(&supplier).await.map_err(ToolError::backend)?;
        Ok(DONE.to_string())
    }

    async fn create_item(&self, input: &str) -> Result<String, ToolError> {
        let payload = Payload::parse(input)?;
        let item = parse_new_item(&payload)?;
        self.items.insert(&item).await.map_err(ToolError::backend)?;
        Ok(DONE.to_string())
    }

    async fn create_sales_order(&self, input: &str) -> Result<String, ToolError> {
        let payload = Payload::parse(input)?;
        let ctx = SalesOrderContext {
            today: (self.today)(),
            default_tax_template: self
                .tax_templates
                .default_template()
                .await
                .map_err(ToolError::backend)?,
        };
        let draft = parse_sales_order(&payload, &ctx)?;
        let taxes = self.resolve_taxes(&draft.tax_plan).await?;
        self.sales.insert_order(&draft.into_order(taxes)).await.map_err(ToolError::backend)?;
        Ok(DONE.to_string())
    }

    async fn create_sales_invoice(&self, input: &str) -> Result<String, ToolError> {
        let payload = Payload::parse(input)?;
        let ctx = SalesInvoiceContext {
            today: (self.today)(),
            default_tax_template: self
                .tax_templates
                .default_template()
                .await
                .map_err(ToolError::backend)?,
            fel_required: self
                .companies
                .fel_required(&self.company)
                .await
                .map_err(ToolError::backend)?,
        };
        let draft = parse_sales_invoice(&payload, &ctx)?;
        let taxes = self.resolve_taxes(&draft.tax_plan).await?;
        self.sales.insert_invoice(&draft.into_invoice(taxes)).await.map_err(ToolError::backend)?;
        Ok(DONE.to_string())
    }

    async fn create_purchase_invoice(&self, input: &str) -> Result<String, ToolError> {
        let payload = Payload::parse(input)?;
        let invoice = parse_purchase_invoice(&payload, (self.today)())?;
        self.purchases.insert_invoice(&invoice).await.map_err(ToolError::backend)?;
        Ok(DONE.to_string())
    }

    async fn item_stats(&self, input: &str) -> Result<String, ToolError> {
        let item_code = scalar(input);
        if !self.items.exists(&item_code).await.map_err(ToolError::backend)? {
            return Err(ToolError::not_found("Item", item_code));
        }
        let stock_level = self.items.stock_balance(&item_code).await.map_err(ToolError::backend)?;
        let last_sale_price = self
            .items
            .last_sale_rate(&item_code)
            .await
            .map_err(ToolError::backend)?
            .unwrap_or(Decimal::ZERO);
        let stats = ItemStats { item_code, stock_level, last_sale_price };
        serde_json::to_string(&stats).map_err(ToolError::backend)
    }

    async fn sales_stats(&self, input: &str) -> Result<String, ToolError> {
        let period = SalesPeriod::parse(input)?;
        let range = period.resolve((self.today)());
        let total_sales =
            self.sales.total_sales_between(&range).await.map_err(ToolError::backend)?;
        let stats = SalesStats { period: period.as_str(), total_sales };
        serde_json::to_string(&stats).map_err(ToolError::backend)
    }

    /// Turns a validated tax plan into stored lines. Template names are the
    /// one thing validators cannot check, so the read happens here.
    async fn resolve_taxes(&self, plan: &TaxPlan) -> Result<ResolvedTaxes, ToolError> {
        match plan {
            TaxPlan::Exempt | TaxPlan::Untaxed => Ok(ResolvedTaxes::none()),
            TaxPlan::Explicit(lines) => Ok(ResolvedTaxes { template: None, lines: lines.clone() }),
            TaxPlan::Template(name) => {
                let lines = self
                    .tax_templates
                    .template_lines(name)
                    .await
                    .map_err(ToolError::backend)?
                    .ok_or_else(|| {
                        ToolError::not_found("Sales Taxes and Charges Template", name.clone())
                    })?;
                Ok(ResolvedTaxes { template: Some(name.clone()), lines })
            }
        }
    }
}

#[derive(Serialize)]
struct SalesStats<'a> {
    period: &'a str,
    total_sales: Decimal,
}

/// Scalar tool arguments arrive as the model wrote them, quotes included.
fn scalar(input: &str) -> String {
    input.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::{json, Value};

    use ceiba_core::domain::sales::IdentificationType;
    use ceiba_core::domain::tax::TaxLine;
    use ceiba_db::repositories::{CustomerRepository, InMemoryErp, ItemRepository};

    use super::{scalar, ToolKind, Toolbox, DONE};
    use crate::fiscal::FiscalLookup;

    struct FakeSat;

    #[async_trait::async_trait]
    impl FiscalLookup for FakeSat {
        async fn lookup_nit(&self, nit: &str) -> anyhow::Result<String> {
            Ok(format!("NIT {nit}"))
        }

        async fn lookup_cui(&self, cui: &str) -> anyhow::Result<String> {
            Ok(format!("CUI {cui}"))
        }
    }

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn toolbox(store: &Arc<InMemoryErp>) -> Toolbox {
        Toolbox {
            customers: store.clone(),
            suppliers: store.clone(),
            items: store.clone(),
            tax_templates: store.clone(),
            companies: store.clone(),
            sales: store.clone(),
            purchases: store.clone(),
            fiscal: Arc::new(FakeSat),
            company: "Ceiba Demo, S.A.".to_string(),
            today: || NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid date"),
        }
    }

    #[test]
    fn wire_names_round_trip_and_cover_the_whole_set() {
        for tool in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(tool.name()), Some(tool));
        }
        assert_eq!(ToolKind::from_name("drop_tables"), None);
    }

    #[test]
    fn scalar_arguments_shed_model_quoting() {
        assert_eq!(scalar(" \"Acme Corp\" "), "Acme Corp");
        assert_eq!(scalar("'LAPTOP-001'"), "LAPTOP-001");
        assert_eq!(scalar("Acme Corp"), "Acme Corp");
    }

    #[tokio::test]
    async fn create_customer_persists_and_answers_done() {
        let store = Arc::new(InMemoryErp::new());
        let tools = toolbox(&store);

        let input = json!({ "customer_name": "Acme Corp", "customer_group": "Commercial" });
        let reply = tools.dispatch(ToolKind::CreateCustomer, &input.to_string()).await;
        assert_eq!(reply, DONE);

        let record = store.find("Acme Corp").await.expect("find").expect("stored");
        assert_eq!(record.customer_group, "Commercial");
    }

    #[tokio::test]
    async fn create_customer_reports_missing_fields_verbatim() {
        let store = Arc::new(InMemoryErp::new());
        let tools = toolbox(&store);

        let reply = tools
            .dispatch(ToolKind::CreateCustomer, &json!({ "customer_name": "Acme" }).to_string())
            .await;
        assert_eq!(reply, "failed: Missing required fields (customer_name or customer_group).");
    }

    #[tokio::test]
    async fn malformed_json_surfaces_the_parser_error() {
        let store = Arc::new(InMemoryErp::new());
        let tools = toolbox(&store);

        let reply = tools.dispatch(ToolKind::CreateCustomer, "{not json").await;
        assert!(reply.starts_with("failed: Invalid JSON format. Error: "), "got: {reply}");

        let reply = tools.dispatch(ToolKind::CreateSalesOrder, "   ").await;
        assert_eq!(reply, "failed: Empty or invalid JSON input.");
    }

    #[tokio::test]
    async fn update_answers_not_found_for_unknown_customers() {
        let store = Arc::new(InMemoryErp::new());
        let tools = toolbox(&store);

        let input = json!({
            "customer_name": "Nobody",
            "fields_to_update": { "customer_group": "Government" }
        });
        let reply = tools.dispatch(ToolKind::UpdateCustomer, &input.to_string()).await;
        assert_eq!(reply, "failed: Customer Nobody not found.");
    }

    #[tokio::test]
    async fn update_applies_the_allowed_fields() {
        let store = Arc::new(InMemoryErp::new());
        let tools = toolbox(&store);

        let create = json!({ "customer_name": "Acme Corp", "customer_group": "Commercial" });
        tools.dispatch(ToolKind::CreateCustomer, &create.to_string()).await;

        let update = json!({
            "customer_name": "Acme Corp",
            "fields_to_update": { "customer_group": "Government", "customer_type": "Company" }
        });
        let reply = tools.dispatch(ToolKind::UpdateCustomer, &update.to_string()).await;
        assert_eq!(reply, DONE);

        let record = store.find("Acme Corp").await.expect("find").expect("stored");
        assert_eq!(record.customer_group, "Government");
    }

    #[tokio::test]
    async fn update_rejects_fields_outside_the_closed_set() {
        let store = Arc::new(InMemoryErp::new());
        let tools = toolbox(&store);

        let input = json!({
            "customer_name": "Acme Corp",
            "fields_to_update": { "credit_limit": 5000 }
        });
        let reply = tools.dispatch(ToolKind::UpdateCustomer, &input.to_string()).await;
        assert_eq!(reply, "failed: Unknown field 'credit_limit' for Customer.");
    }

    #[tokio::test]
    async fn delete_and_info_share_the_not_found_wording() {
        let store = Arc::new(InMemoryErp::new());
        let tools = toolbox(&store);

        let create = json!({ "customer_name": "Acme Corp", "customer_group": "Commercial" });
        tools.dispatch(ToolKind::CreateCustomer, &create.to_string()).await;

        let info = tools.dispatch(ToolKind::GetCustomerInfo, "\"Acme Corp\"").await;
        let record: Value = serde_json::from_str(&info).expect("info is JSON");
        assert_eq!(record["customer_name"], "Acme Corp");
        assert_eq!(record["customer_type"], "Individual");

        assert_eq!(tools.dispatch(ToolKind::DeleteCustomer, "Acme Corp").await, DONE);
        assert_eq!(
            tools.dispatch(ToolKind::GetCustomerInfo, "Acme Corp").await,
            "failed: Customer Acme Corp not found."
        );
        assert_eq!(
            tools.dispatch(ToolKind::DeleteCustomer, "Acme Corp").await,
            "failed: Customer Acme Corp not found."
        );
    }

    #[tokio::test]
    async fn supplier_and_item_writes_answer_done() {
        let store = Arc::new(InMemoryErp::new());
        let tools = toolbox(&store);

        let supplier = json!({ "supplier_name": "Distribuidora Sol", "supplier_group": "Local" });
        assert_eq!(tools.dispatch(ToolKind::CreateSupplier, &supplier.to_string()).await, DONE);

        let item = json!({
            "item_code": "LAPTOP-001",
            "item_group": "Products",
            "stock_uom": "Nos",
            "standard_rate": 750
        });
        assert_eq!(tools.dispatch(ToolKind::CreateItem, &item.to_string()).await, DONE);
        assert!(store.exists("LAPTOP-001").await.expect("exists"));
    }

    #[tokio::test]
    async fn sales_order_resolves_the_default_template() {
        let store = Arc::new(InMemoryErp::new());
        store
            .set_tax_template(
                "IVA 12%",
                vec![TaxLine::on_net_total("IVA por Pagar", Decimal::from(12))],
            )
            .await;
        store.set_default_template("IVA 12%").await;
        let tools = toolbox(&store);

        let input = json!({
            "customer": "Acme Corp",
            "items": [{ "item_code": "LAPTOP-001", "qty": 2, "rate": 100 }]
        });
        assert_eq!(tools.dispatch(ToolKind::CreateSalesOrder, &input.to_string()).await, DONE);

        let order = store.last_order().await.expect("order stored");
        assert_eq!(order.posting_date, day(2024, 3, 15));
        assert_eq!(order.delivery_date, day(2024, 3, 31));
        assert_eq!(order.taxes.template.as_deref(), Some("IVA 12%"));
        assert_eq!(order.taxes.lines.len(), 1);
        assert_eq!(order.grand_total(), Decimal::from(224));
    }

    #[tokio::test]
    async fn exempt_orders_store_no_tax_lines() {
        let store = Arc::new(InMemoryErp::new());
        store.set_default_template("IVA 12%").await;
        let tools = toolbox(&store);

        let input = json!({
            "customer": "Acme Corp",
            "items": [{ "item_code": "LAPTOP-001", "qty": 1, "rate": 100 }],
            "additional_notes": "Factura EXENTA por convenio"
        });
        assert_eq!(tools.dispatch(ToolKind::CreateSalesOrder, &input.to_string()).await, DONE);

        let order = store.last_order().await.expect("order stored");
        assert_eq!(order.taxes.template, None);
        assert!(order.taxes.lines.is_empty());
    }

    #[tokio::test]
    async fn unknown_template_names_fail_by_name() {
        let store = Arc::new(InMemoryErp::new());
        let tools = toolbox(&store);

        let input = json!({
            "customer": "Acme Corp",
            "items": [{ "item_code": "LAPTOP-001", "qty": 1, "rate": 100 }],
            "taxes_and_charges": "IVA Especial"
        });
        let reply = tools.dispatch(ToolKind::CreateSalesOrder, &input.to_string()).await;
        assert_eq!(reply, "failed: Sales Taxes and Charges Template IVA Especial not found.");
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn fel_companies_require_receptor_identification() {
        let store = Arc::new(InMemoryErp::new());
        store.enable_fel("Ceiba Demo, S.A.").await;
        let tools = toolbox(&store);

        let input = json!({
            "customer": "Acme Corp",
            "items": [{ "item_code": "LAPTOP-001", "qty": 1, "rate": 100 }]
        });
        let reply = tools.dispatch(ToolKind::CreateSalesInvoice, &input.to_string()).await;
        assert_eq!(reply, "failed: Missing required field 'id_identificacion'.");

        let input = json!({
            "customer": "Acme Corp",
            "items": [{ "item_code": "LAPTOP-001", "qty": 1, "rate": 100 }],
            "id_identificacion": "NIT",
            "id_receptor_": 123456789,
            "fel_status": "CON FEL"
        });
        assert_eq!(tools.dispatch(ToolKind::CreateSalesInvoice, &input.to_string()).await, DONE);

        let invoice = store.last_invoice().await.expect("invoice stored");
        let receptor = invoice.receptor.expect("receptor stamped");
        assert_eq!(receptor.id_type, IdentificationType::Nit);
        assert_eq!(receptor.number, "123456789");
        assert!(invoice.custom_fel);
    }

    #[tokio::test]
    async fn invoices_without_fel_accept_bare_payloads() {
        let store = Arc::new(InMemoryErp::new());
        let tools = toolbox(&store);

        let input = json!({
            "customer": "Acme Corp",
            "items": [{ "item_code": "LAPTOP-001", "qty": 1, "rate": 100 }]
        });
        assert_eq!(tools.dispatch(ToolKind::CreateSalesInvoice, &input.to_string()).await, DONE);

        let invoice = store.last_invoice().await.expect("invoice stored");
        assert_eq!(invoice.receptor, None);
        assert!(!invoice.custom_fel);
        assert!(invoice.update_stock);
        assert_eq!(invoice.due_date, day(2024, 3, 31));
    }

    #[tokio::test]
    async fn purchase_invoices_bill_today() {
        let store = Arc::new(InMemoryErp::new());
        let tools = toolbox(&store);

        let input = json!({
            "supplier": "Distribuidora Sol",
            "items": [{ "item_code": "LAPTOP-001", "qty": 5, "rate": 80 }]
        });
        assert_eq!(
            tools.dispatch(ToolKind::CreatePurchaseInvoice, &input.to_string()).await,
            DONE
        );

        let invoice = store.last_purchase().await.expect("purchase stored");
        assert_eq!(invoice.bill_date, day(2024, 3, 15));
        assert_eq!(invoice.due_date, day(2024, 3, 15));
        assert_eq!(invoice.grand_total(), Decimal::from(400));
    }

    #[tokio::test]
    async fn item_stats_answer_stock_and_last_rate() {
        let store = Arc::new(InMemoryErp::new());
        let tools = toolbox(&store);

        let item =
            json!({ "item_code": "LAPTOP-001", "item_group": "Products", "stock_uom": "Nos" });
        tools.dispatch(ToolKind::CreateItem, &item.to_string()).await;
        store.push_ledger_entry("LAPTOP-001", Decimal::from(10)).await;
        store.push_ledger_entry("LAPTOP-001", Decimal::from(-3)).await;
        store.push_sale_line("LAPTOP-001", Decimal::from(115)).await;

        let reply = tools.dispatch(ToolKind::GetItemStats, "LAPTOP-001").await;
        let stats: Value = serde_json::from_str(&reply).expect("stats are JSON");
        assert_eq!(stats["item_code"], "LAPTOP-001");
        assert_eq!(stats["stock_level"], "7");
        assert_eq!(stats["last_sale_price"], "115");
    }

    #[tokio::test]
    async fn item_stats_default_the_price_for_never_sold_items() {
        let store = Arc::new(InMemoryErp::new());
        let tools = toolbox(&store);

        let item =
            json!({ "item_code": "LAPTOP-001", "item_group": "Products", "stock_uom": "Nos" });
        tools.dispatch(ToolKind::CreateItem, &item.to_string()).await;

        let reply = tools.dispatch(ToolKind::GetItemStats, "LAPTOP-001").await;
        let stats: Value = serde_json::from_str(&reply).expect("stats are JSON");
        assert_eq!(stats["stock_level"], "0");
        assert_eq!(stats["last_sale_price"], "0");

        assert_eq!(
            tools.dispatch(ToolKind::GetItemStats, "GHOST-9").await,
            "failed: Item GHOST-9 not found."
        );
    }

    #[tokio::test]
    async fn sales_stats_sum_only_the_requested_window() {
        let store = Arc::new(InMemoryErp::new());
        store.push_submitted_invoice(day(2024, 2, 10), Decimal::from(2500)).await;
        store.push_submitted_invoice(day(2024, 3, 1), Decimal::from(999)).await;
        store.push_submitted_invoice(day(2023, 12, 20), Decimal::from(40)).await;
        let tools = toolbox(&store);

        let reply = tools.dispatch(ToolKind::GetSalesStats, "last_month").await;
        let stats: Value = serde_json::from_str(&reply).expect("stats are JSON");
        assert_eq!(stats["period"], "last_month");
        assert_eq!(stats["total_sales"], "2500");

        let reply = tools.dispatch(ToolKind::GetSalesStats, "\"this_year\"").await;
        let stats: Value = serde_json::from_str(&reply).expect("stats are JSON");
        assert_eq!(stats["total_sales"], "3499");
    }

    #[tokio::test]
    async fn sales_stats_reject_unknown_periods_verbatim() {
        let store = Arc::new(InMemoryErp::new());
        let tools = toolbox(&store);

        let reply = tools.dispatch(ToolKind::GetSalesStats, "last week").await;
        assert_eq!(reply, "failed: Invalid period specified. Use 'last_month' or 'this_year'.");
    }

    #[tokio::test]
    async fn sat_lookup_routes_on_length_through_dispatch() {
        let store = Arc::new(InMemoryErp::new());
        let tools = toolbox(&store);

        assert_eq!(
            tools.dispatch(ToolKind::ConsultarIdentificacionSat, "\"123456789\"").await,
            "NIT 123456789"
        );
        assert_eq!(
            tools.dispatch(ToolKind::ConsultarIdentificacionSat, "1234567890123").await,
            "CUI 1234567890123"
        );
    }
}
