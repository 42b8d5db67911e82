use chrono::NaiveDate;
use serde_json::Value;

use crate::dates::last_day_of_month;
use crate::domain::sales::{IdentificationType, LineItem, Receptor, SalesInvoice, SalesOrder};
use crate::domain::tax::{ResolvedTaxes, TaxLine, TaxPlan};
use crate::errors::ValidationError;
use crate::payload::{decimal_in, text_in, Payload};

#[derive(Clone, Debug)]
pub struct SalesOrderContext {
    pub today: NaiveDate,
    pub default_tax_template: Option<String>,
}

#[derive(Clone, Debug)]
pub struct SalesInvoiceContext {
    pub today: NaiveDate,
    pub default_tax_template: Option<String>,
    /// The acting company emits electronic invoices, so receptor
    /// identification becomes mandatory.
    pub fel_required: bool,
}

/// Sales order as validated, before template lines are read from the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SalesOrderDraft {
    pub customer: String,
    pub posting_date: NaiveDate,
    pub delivery_date: NaiveDate,
    pub cost_center: Option<String>,
    pub items: Vec<LineItem>,
    pub tax_plan: TaxPlan,
}

impl SalesOrderDraft {
    pub fn into_order(self, taxes: ResolvedTaxes) -> SalesOrder {
        SalesOrder {
            customer: self.customer,
            posting_date: self.posting_date,
            delivery_date: self.delivery_date,
            cost_center: self.cost_center,
            items: self.items,
            taxes,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SalesInvoiceDraft {
    pub customer: String,
    pub posting_date: NaiveDate,
    pub due_date: NaiveDate,
    pub cost_center: Option<String>,
    pub update_stock: bool,
    pub custom_fel: bool,
    pub receptor: Option<Receptor>,
    pub items: Vec<LineItem>,
    pub tax_plan: TaxPlan,
}

impl SalesInvoiceDraft {
    pub fn into_invoice(self, taxes: ResolvedTaxes) -> SalesInvoice {
        SalesInvoice {
            customer: self.customer,
            posting_date: self.posting_date,
            due_date: self.due_date,
            cost_center: self.cost_center,
            update_stock: self.update_stock,
            custom_fel: self.custom_fel,
            receptor: self.receptor,
            items: self.items,
            taxes,
        }
    }
}

pub fn parse_sales_order(
    payload: &Payload,
    ctx: &SalesOrderContext,
) -> Result<SalesOrderDraft, ValidationError> {
    let customer = payload.required_text("customer")?.to_string();
    let items = parse_line_items(payload)?;
    let tax_plan = parse_tax_plan(payload, ctx.default_tax_template.as_deref())?;
    Ok(SalesOrderDraft {
        customer,
        posting_date: ctx.today,
        delivery_date: last_day_of_month(ctx.today),
        cost_center: payload.text("cost_center").map(str::to_string),
        items,
        tax_plan,
    })
}

pub fn parse_sales_invoice(
    payload: &Payload,
    ctx: &SalesInvoiceContext,
) -> Result<SalesInvoiceDraft, ValidationError> {
    let customer = payload.required_text("customer")?.to_string();
    let items = parse_line_items(payload)?;

    // Identification format is checked whenever the fields are supplied;
    // whether they are mandatory depends on the company's FEL configuration.
    let id_type = payload.text("id_identificacion").map(IdentificationType::parse).transpose()?;
    let receptor_number = match payload.raw("id_receptor_") {
        None | Some(Value::Null) => None,
        Some(value) => Some(receptor_digits(value)?),
    };
    if ctx.fel_required {
        if id_type.is_none() {
            return Err(ValidationError::MissingField("id_identificacion"));
        }
        if receptor_number.is_none() {
            return Err(ValidationError::MissingField("id_receptor_"));
        }
    }
    let receptor = match (id_type, receptor_number) {
        (Some(id_type), Some(number)) => Some(Receptor { id_type, number }),
        _ => None,
    };

    let custom_fel = ctx.fel_required
        && payload.text("fel_status").is_some_and(|status| status.to_uppercase() == "CON FEL");
    let tax_plan = parse_tax_plan(payload, ctx.default_tax_template.as_deref())?;

    Ok(SalesInvoiceDraft {
        customer,
        posting_date: ctx.today,
        due_date: last_day_of_month(ctx.today),
        cost_center: payload.text("cost_center").map(str::to_string),
        update_stock: payload.flag("update_stock").unwrap_or(true),
        custom_fel,
        receptor,
        items,
        tax_plan,
    })
}

/// Parses the mandatory `items` table. Every row needs a code, a non-zero
/// quantity, and a non-zero rate.
pub(crate) fn parse_line_items(payload: &Payload) -> Result<Vec<LineItem>, ValidationError> {
    let entries = payload.list("items").ok_or(ValidationError::MissingField("items"))?;
    let mut items = Vec::with_capacity(entries.len());
    for entry in entries {
        let fields = entry.as_object().ok_or_else(incomplete_item)?;
        let item_code = text_in(fields, "item_code").ok_or_else(incomplete_item)?;
        let qty =
            decimal_in(fields, "qty").filter(|n| !n.is_zero()).ok_or_else(incomplete_item)?;
        let rate =
            decimal_in(fields, "rate").filter(|n| !n.is_zero()).ok_or_else(incomplete_item)?;
        items.push(LineItem { item_code: item_code.to_string(), qty, rate });
    }
    Ok(items)
}

/// Tax sourcing, in the order the payloads get to claim it: an exemption in
/// the notes wins outright, then payload-supplied lines, then a named
/// template, then the configured default.
fn parse_tax_plan(
    payload: &Payload,
    default_template: Option<&str>,
) -> Result<TaxPlan, ValidationError> {
    if exemption_in_notes(payload.text("additional_notes")) {
        return Ok(TaxPlan::Exempt);
    }
    if let Some(entries) = payload.list("taxes") {
        return Ok(TaxPlan::Explicit(parse_tax_lines(entries)?));
    }
    if let Some(name) = payload.text("taxes_and_charges") {
        return Ok(TaxPlan::Template(name.to_string()));
    }
    match default_template {
        Some(name) => Ok(TaxPlan::Template(name.to_string())),
        None => Ok(TaxPlan::Untaxed),
    }
}

fn parse_tax_lines(entries: &[Value]) -> Result<Vec<TaxLine>, ValidationError> {
    let mut lines = Vec::with_capacity(entries.len());
    for entry in entries {
        let fields = entry.as_object().ok_or_else(incomplete_tax)?;
        let account_head = text_in(fields, "account_head").ok_or_else(incomplete_tax)?;
        let rate = decimal_in(fields, "rate").filter(|n| !n.is_zero()).ok_or_else(incomplete_tax)?;
        lines.push(TaxLine::on_net_total(account_head, rate));
    }
    Ok(lines)
}

fn exemption_in_notes(notes: Option<&str>) -> bool {
    notes.is_some_and(|notes| {
        let upper = notes.to_uppercase();
        upper.contains("EXENTO") || upper.contains("EXENTA")
    })
}

fn receptor_digits(value: &Value) -> Result<String, ValidationError> {
    let text = match value {
        Value::String(text) => text.trim().to_string(),
        Value::Number(number) => number.to_string(),
        _ => return Err(ValidationError::InvalidReceptorNumber),
    };
    if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
        Ok(text)
    } else {
        Err(ValidationError::InvalidReceptorNumber)
    }
}

fn incomplete_item() -> ValidationError {
    ValidationError::MissingListFields { list: "items", fields: "item_code, qty, or rate" }
}

fn incomplete_tax() -> ValidationError {
    ValidationError::MissingListFields { list: "taxes", fields: "account_head or rate" }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use serde_json::json;

    use crate::domain::sales::IdentificationType;
    use crate::domain::tax::{TaxLine, TaxPlan};
    use crate::errors::ValidationError;
    use crate::payload::Payload;
    use crate::validate::{
        parse_sales_invoice, parse_sales_order, SalesInvoiceContext, SalesOrderContext,
    };

    fn payload(value: serde_json::Value) -> Payload {
        Payload::parse(&value.to_string()).expect("payload parses")
    }

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn order_ctx() -> SalesOrderContext {
        SalesOrderContext {
            today: day(2024, 3, 15),
            default_tax_template: Some("IVA 12%".to_string()),
        }
    }

    fn invoice_ctx(fel_required: bool) -> SalesInvoiceContext {
        SalesInvoiceContext {
            today: day(2024, 3, 15),
            default_tax_template: Some("IVA 12%".to_string()),
            fel_required,
        }
    }

    fn items() -> serde_json::Value {
        json!([{ "item_code": "SKU-1", "qty": 2, "rate": 100 }])
    }

    #[test]
    fn order_reports_customer_before_items() {
        let error =
            parse_sales_order(&payload(json!({})), &order_ctx()).expect_err("nothing supplied");
        assert_eq!(error, ValidationError::MissingField("customer"));

        let error = parse_sales_order(&payload(json!({ "customer": "Acme Corp" })), &order_ctx())
            .expect_err("items missing");
        assert_eq!(error, ValidationError::MissingField("items"));
    }

    #[test]
    fn order_rejects_incomplete_item_rows() {
        let error = parse_sales_order(
            &payload(json!({
                "customer": "Acme Corp",
                "items": [{ "item_code": "SKU-1", "qty": 0, "rate": 100 }]
            })),
            &order_ctx(),
        )
        .expect_err("zero qty is missing");
        assert_eq!(
            error.to_string(),
            "Missing required fields in 'items' (item_code, qty, or rate)."
        );
    }

    #[test]
    fn order_dates_default_to_today_and_month_end() {
        let draft =
            parse_sales_order(&payload(json!({ "customer": "Acme Corp", "items": items() })), &order_ctx())
                .expect("valid order");
        assert_eq!(draft.posting_date, day(2024, 3, 15));
        assert_eq!(draft.delivery_date, day(2024, 3, 31));
    }

    #[test]
    fn order_falls_back_to_the_default_template() {
        let draft =
            parse_sales_order(&payload(json!({ "customer": "Acme Corp", "items": items() })), &order_ctx())
                .expect("valid order");
        assert_eq!(draft.tax_plan, TaxPlan::Template("IVA 12%".to_string()));
    }

    #[test]
    fn order_without_default_template_is_untaxed() {
        let ctx = SalesOrderContext { today: day(2024, 3, 15), default_tax_template: None };
        let draft =
            parse_sales_order(&payload(json!({ "customer": "Acme Corp", "items": items() })), &ctx)
                .expect("valid order");
        assert_eq!(draft.tax_plan, TaxPlan::Untaxed);
    }

    #[test]
    fn payload_template_beats_the_default() {
        let draft = parse_sales_order(
            &payload(json!({
                "customer": "Acme Corp",
                "items": items(),
                "taxes_and_charges": "IVA Pequeño Contribuyente"
            })),
            &order_ctx(),
        )
        .expect("valid order");
        assert_eq!(draft.tax_plan, TaxPlan::Template("IVA Pequeño Contribuyente".to_string()));
    }

    #[test]
    fn explicit_tax_lines_beat_any_template() {
        let draft = parse_sales_order(
            &payload(json!({
                "customer": "Acme Corp",
                "items": items(),
                "taxes_and_charges": "IVA 12%",
                "taxes": [{ "account_head": "IVA por Pagar", "rate": 5 }]
            })),
            &order_ctx(),
        )
        .expect("valid order");
        assert_eq!(
            draft.tax_plan,
            TaxPlan::Explicit(vec![TaxLine::on_net_total("IVA por Pagar", Decimal::from(5))])
        );
    }

    #[test]
    fn exemption_note_wins_over_everything_else() {
        let draft = parse_sales_order(
            &payload(json!({
                "customer": "Acme Corp",
                "items": items(),
                "additional_notes": "Venta exenta según resolución",
                "taxes": [{ "account_head": "IVA por Pagar" }]
            })),
            &order_ctx(),
        )
        .expect("exempt order skips tax validation");
        assert_eq!(draft.tax_plan, TaxPlan::Exempt);
    }

    #[test]
    fn incomplete_tax_rows_are_rejected() {
        let error = parse_sales_order(
            &payload(json!({
                "customer": "Acme Corp",
                "items": items(),
                "taxes": [{ "account_head": "IVA por Pagar" }]
            })),
            &order_ctx(),
        )
        .expect_err("rate missing");
        assert_eq!(
            error.to_string(),
            "Missing required fields in 'taxes' (account_head or rate)."
        );
    }

    #[test]
    fn invoice_checks_identification_format_even_without_fel() {
        let error = parse_sales_invoice(
            &payload(json!({
                "customer": "Acme Corp",
                "items": items(),
                "id_identificacion": "DPI"
            })),
            &invoice_ctx(false),
        )
        .expect_err("label outside NIT/CUI");
        assert_eq!(error, ValidationError::InvalidIdentificationType);

        let error = parse_sales_invoice(
            &payload(json!({
                "customer": "Acme Corp",
                "items": items(),
                "id_receptor_": "12A45"
            })),
            &invoice_ctx(false),
        )
        .expect_err("non-digits in the receptor number");
        assert_eq!(error, ValidationError::InvalidReceptorNumber);
    }

    #[test]
    fn fel_companies_require_the_identification_pair() {
        let error = parse_sales_invoice(
            &payload(json!({ "customer": "Acme Corp", "items": items() })),
            &invoice_ctx(true),
        )
        .expect_err("identification type mandatory under FEL");
        assert_eq!(error, ValidationError::MissingField("id_identificacion"));

        let error = parse_sales_invoice(
            &payload(json!({
                "customer": "Acme Corp",
                "items": items(),
                "id_identificacion": "NIT"
            })),
            &invoice_ctx(true),
        )
        .expect_err("receptor number mandatory under FEL");
        assert_eq!(error, ValidationError::MissingField("id_receptor_"));
    }

    #[test]
    fn fel_invoice_carries_the_receptor_pair() {
        let draft = parse_sales_invoice(
            &payload(json!({
                "customer": "Acme Corp",
                "items": items(),
                "id_identificacion": "NIT",
                "id_receptor_": 123456789,
                "fel_status": "Con Fel"
            })),
            &invoice_ctx(true),
        )
        .expect("valid FEL invoice");
        let receptor = draft.receptor.expect("receptor present");
        assert_eq!(receptor.id_type, IdentificationType::Nit);
        assert_eq!(receptor.number, "123456789");
        assert!(draft.custom_fel);
    }

    #[test]
    fn fel_flag_requires_the_exact_status() {
        let draft = parse_sales_invoice(
            &payload(json!({
                "customer": "Acme Corp",
                "items": items(),
                "id_identificacion": "CUI",
                "id_receptor_": "1234567890123",
                "fel_status": "SIN FEL"
            })),
            &invoice_ctx(true),
        )
        .expect("valid invoice");
        assert!(!draft.custom_fel);
    }

    #[test]
    fn invoice_updates_stock_by_default() {
        let draft = parse_sales_invoice(
            &payload(json!({ "customer": "Acme Corp", "items": items() })),
            &invoice_ctx(false),
        )
        .expect("valid invoice");
        assert!(draft.update_stock);
        assert!(!draft.custom_fel);

        let draft = parse_sales_invoice(
            &payload(json!({ "customer": "Acme Corp", "items": items(), "update_stock": 0 })),
            &invoice_ctx(false),
        )
        .expect("valid invoice");
        assert!(!draft.update_stock);
    }

    #[test]
    fn invoice_due_date_lands_on_month_end() {
        let ctx = SalesInvoiceContext {
            today: day(2024, 2, 10),
            default_tax_template: None,
            fel_required: false,
        };
        let draft =
            parse_sales_invoice(&payload(json!({ "customer": "Acme Corp", "items": items() })), &ctx)
                .expect("valid invoice");
        assert_eq!(draft.posting_date, day(2024, 2, 10));
        assert_eq!(draft.due_date, day(2024, 2, 29));
    }
}
