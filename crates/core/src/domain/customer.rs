use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomerType {
    #[default]
    Individual,
    Company,
}

impl CustomerType {
    /// Accepts the ERP labels case-insensitively.
    pub fn parse(label: &str) -> Result<Self, ValidationError> {
        match label.trim().to_lowercase().as_str() {
            "individual" => Ok(Self::Individual),
            "company" => Ok(Self::Company),
            _ => Err(ValidationError::InvalidCustomerType),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "Individual",
            Self::Company => "Company",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_name: String,
    pub customer_group: String,
    pub customer_type: CustomerType,
}

/// Partial update applied to an existing customer. Only the fields the
/// payload names are touched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CustomerFields {
    pub customer_group: Option<String>,
    pub customer_type: Option<CustomerType>,
}

impl CustomerFields {
    pub fn is_empty(&self) -> bool {
        self.customer_group.is_none() && self.customer_type.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomerUpdate {
    pub customer_name: String,
    pub fields: CustomerFields,
}

#[cfg(test)]
mod tests {
    use crate::domain::customer::CustomerType;
    use crate::errors::ValidationError;

    #[test]
    fn customer_type_labels_parse_case_insensitively() {
        assert_eq!(CustomerType::parse("Individual"), Ok(CustomerType::Individual));
        assert_eq!(CustomerType::parse("company"), Ok(CustomerType::Company));
        assert_eq!(CustomerType::parse(" COMPANY "), Ok(CustomerType::Company));
        assert_eq!(CustomerType::parse("corporation"), Err(ValidationError::InvalidCustomerType));
    }

    #[test]
    fn customer_type_round_trips_through_its_label() {
        for kind in [CustomerType::Individual, CustomerType::Company] {
            assert_eq!(CustomerType::parse(kind.as_str()), Ok(kind));
        }
    }
}
