use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::tax::ResolvedTaxes;
use crate::errors::ValidationError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_code: String,
    pub qty: Decimal,
    pub rate: Decimal,
}

impl LineItem {
    pub fn amount(&self) -> Decimal {
        self.qty * self.rate
    }
}

/// Guatemalan taxpayer identification accepted on electronic invoices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdentificationType {
    Nit,
    Cui,
}

impl IdentificationType {
    /// Accepts the labels case-insensitively.
    pub fn parse(label: &str) -> Result<Self, ValidationError> {
        match label.trim().to_uppercase().as_str() {
            "NIT" => Ok(Self::Nit),
            "CUI" => Ok(Self::Cui),
            _ => Err(ValidationError::InvalidIdentificationType),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nit => "NIT",
            Self::Cui => "CUI",
        }
    }
}

/// Receptor identification stamped on an electronic invoice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receptor {
    pub id_type: IdentificationType,
    pub number: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SalesOrder {
    pub customer: String,
    pub posting_date: NaiveDate,
    pub delivery_date: NaiveDate,
    pub cost_center: Option<String>,
    pub items: Vec<LineItem>,
    pub taxes: ResolvedTaxes,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SalesInvoice {
    pub customer: String,
    pub posting_date: NaiveDate,
    pub due_date: NaiveDate,
    pub cost_center: Option<String>,
    pub update_stock: bool,
    /// Electronic-invoice (FEL) flag carried by invoices of companies that
    /// emit them.
    pub custom_fel: bool,
    pub receptor: Option<Receptor>,
    pub items: Vec<LineItem>,
    pub taxes: ResolvedTaxes,
}

pub fn net_total(items: &[LineItem]) -> Decimal {
    items.iter().map(LineItem::amount).sum()
}

/// Net total plus every percentage tax line applied to it.
pub fn grand_total(items: &[LineItem], taxes: &ResolvedTaxes) -> Decimal {
    let net = net_total(items);
    let tax_total: Decimal =
        taxes.lines.iter().map(|line| net * line.rate / Decimal::ONE_HUNDRED).sum();
    net + tax_total
}

impl SalesOrder {
    pub fn grand_total(&self) -> Decimal {
        grand_total(&self.items, &self.taxes)
    }
}

impl SalesInvoice {
    pub fn grand_total(&self) -> Decimal {
        grand_total(&self.items, &self.taxes)
    }
}
