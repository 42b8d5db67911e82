use chrono::NaiveDate;

use crate::domain::purchase::PurchaseInvoice;
use crate::errors::ValidationError;
use crate::payload::Payload;
use crate::validate::sales::parse_line_items;

/// Purchase invoices bill on the day they are captured, so both dates
/// default to today.
pub fn parse_purchase_invoice(
    payload: &Payload,
    today: NaiveDate,
) -> Result<PurchaseInvoice, ValidationError> {
    let supplier = payload.required_text("supplier")?.to_string();
    let items = parse_line_items(payload)?;
    Ok(PurchaseInvoice {
        supplier,
        bill_date: today,
        due_date: today,
        update_stock: payload.flag("update_stock").unwrap_or(true),
        items,
    })
}
