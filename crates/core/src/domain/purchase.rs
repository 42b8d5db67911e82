use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::sales::{net_total, LineItem};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseInvoice {
    pub supplier: String,
    pub bill_date: NaiveDate,
    pub due_date: NaiveDate,
    pub update_stock: bool,
    pub items: Vec<LineItem>,
}

impl PurchaseInvoice {
    pub fn grand_total(&self) -> Decimal {
        net_total(&self.items)
    }
}
