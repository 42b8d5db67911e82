//! Payload validators for the documents the assistant can write.
//!
//! Each validator turns a [`Payload`](crate::payload::Payload) into a typed
//! domain record, or reports the first missing/invalid field in the exact
//! wording the tool boundary surfaces to the agent. Validators are pure;
//! anything that needs a store read (template lines, existence checks) stays
//! in the tool layer.

mod customer;
mod item;
mod purchase;
mod sales;
mod supplier;

pub use customer::{parse_customer_update, parse_new_customer};
pub use item::parse_new_item;
pub use purchase::parse_purchase_invoice;
pub use sales::{
    parse_sales_invoice, parse_sales_order, SalesInvoiceContext, SalesInvoiceDraft,
    SalesOrderContext, SalesOrderDraft,
};
pub use supplier::parse_new_supplier;
