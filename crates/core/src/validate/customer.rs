use serde_json::Value;

use crate::domain::customer::{Customer, CustomerFields, CustomerType, CustomerUpdate};
use crate::errors::ValidationError;
use crate::payload::Payload;

pub fn parse_new_customer(payload: &Payload) -> Result<Customer, ValidationError> {
    let (Some(customer_name), Some(customer_group)) =
        (payload.text("customer_name"), payload.text("customer_group"))
    else {
        return Err(ValidationError::MissingFields("customer_name or customer_group"));
    };
    let customer_type = match payload.text("customer_type") {
        Some(label) => CustomerType::parse(label)?,
        None => CustomerType::default(),
    };
    Ok(Customer {
        customer_name: customer_name.to_string(),
        customer_group: customer_group.to_string(),
        customer_type,
    })
}

/// `fields_to_update` is a closed set: only the customer fields the
/// assistant is allowed to touch are accepted, anything else is rejected by
/// name. Blank values are skipped; an update that skips everything counts
/// as carrying no fields at all.
pub fn parse_customer_update(payload: &Payload) -> Result<CustomerUpdate, ValidationError> {
    let (Some(customer_name), Some(entries)) =
        (payload.text("customer_name"), payload.object("fields_to_update"))
    else {
        return Err(ValidationError::MissingFields("customer_name or fields_to_update"));
    };

    let mut fields = CustomerFields::default();
    for (key, value) in entries {
        match key.as_str() {
            "customer_group" => fields.customer_group = non_blank(value),
            "customer_type" => {
                if let Some(label) = non_blank(value) {
                    fields.customer_type = Some(CustomerType::parse(&label)?);
                }
            }
            other => return Err(ValidationError::UnknownCustomerField(other.to_string())),
        }
    }
    if fields.is_empty() {
        return Err(ValidationError::MissingFields("customer_name or fields_to_update"));
    }

    Ok(CustomerUpdate { customer_name: customer_name.to_string(), fields })
}

fn non_blank(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}
