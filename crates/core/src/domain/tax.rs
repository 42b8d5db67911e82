use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const CHARGE_ON_NET_TOTAL: &str = "On Net Total";

/// One line of a sales-taxes table. All lines the assistant writes are
/// percentage charges on the net total.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxLine {
    pub charge_type: String,
    pub account_head: String,
    pub rate: Decimal,
}

impl TaxLine {
    pub fn on_net_total(account_head: impl Into<String>, rate: Decimal) -> Self {
        Self {
            charge_type: CHARGE_ON_NET_TOTAL.to_string(),
            account_head: account_head.into(),
            rate,
        }
    }
}

/// How a sales document wants its taxes sourced, as stated by the payload.
/// Template lines still have to be read from the store, so documents carry
/// this plan until the tool layer resolves it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaxPlan {
    /// `additional_notes` marked the document tax-exempt.
    Exempt,
    /// Apply a named template (payload-supplied or the configured default).
    Template(String),
    /// The payload carried its own tax lines.
    Explicit(Vec<TaxLine>),
    /// No template named, no default configured, no explicit lines.
    Untaxed,
}

/// Tax plan after template lines were read from the store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolvedTaxes {
    pub template: Option<String>,
    pub lines: Vec<TaxLine>,
}

impl ResolvedTaxes {
    pub fn none() -> Self {
        Self::default()
    }
}
