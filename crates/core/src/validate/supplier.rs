use crate::domain::supplier::Supplier;
use crate::errors::ValidationError;
use crate::payload::Payload;

pub fn parse_new_supplier(payload: &Payload) -> Result<Supplier, ValidationError> {
    let (Some(supplier_name), Some(supplier_group)) =
        (payload.text("supplier_name"), payload.text("supplier_group"))
    else {
        return Err(ValidationError::MissingFields("supplier_name or supplier_group"));
    };
    Ok(Supplier {
        supplier_name: supplier_name.to_string(),
        supplier_group: supplier_group.to_string(),
    })
}
