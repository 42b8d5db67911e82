pub mod config;
pub mod dates;
pub mod domain;
pub mod errors;
pub mod payload;
pub mod validate;

pub use dates::{last_day_of_month, DateRange, SalesPeriod};
pub use domain::customer::{Customer, CustomerFields, CustomerType, CustomerUpdate};
pub use domain::item::{Item, ItemStats};
pub use domain::purchase::PurchaseInvoice;
pub use domain::sales::{IdentificationType, LineItem, Receptor, SalesInvoice, SalesOrder};
pub use domain::supplier::Supplier;
pub use domain::tax::{ResolvedTaxes, TaxLine, TaxPlan};
pub use errors::{ToolError, ValidationError};
pub use payload::Payload;
