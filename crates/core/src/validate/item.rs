use rust_decimal::Decimal;

use crate::domain::item::Item;
use crate::errors::ValidationError;
use crate::payload::Payload;

pub fn parse_new_item(payload: &Payload) -> Result<Item, ValidationError> {
    let (Some(item_code), Some(item_group), Some(stock_uom)) =
        (payload.text("item_code"), payload.text("item_group"), payload.text("stock_uom"))
    else {
        return Err(ValidationError::MissingFields("item_code, item_group, or stock_uom"));
    };
    Ok(Item {
        item_code: item_code.to_string(),
        item_group: item_group.to_string(),
        stock_uom: stock_uom.to_string(),
        standard_rate: payload.decimal("standard_rate").unwrap_or(Decimal::ZERO),
    })
}
