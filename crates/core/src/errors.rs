use thiserror::Error;

/// Why a tool payload was rejected before touching any store.
///
/// Display text is the exact reason shown to the agent; the tool boundary
/// prepends `failed: ` when it turns one of these into an observation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Empty or invalid JSON input.")]
    EmptyPayload,
    #[error("Invalid JSON format. Error: {0}")]
    MalformedPayload(String),
    #[error("Missing required field '{0}'.")]
    MissingField(&'static str),
    #[error("Missing required fields ({0}).")]
    MissingFields(&'static str),
    #[error("Missing required fields in '{list}' ({fields}).")]
    MissingListFields { list: &'static str, fields: &'static str },
    #[error("'customer_type' must be 'Individual' or 'Company'.")]
    InvalidCustomerType,
    #[error("'id_identificacion' must be 'NIT' or 'CUI'.")]
    InvalidIdentificationType,
    #[error("'id_receptor_' must be a numeric value.")]
    InvalidReceptorNumber,
    #[error("Unknown field '{0}' for Customer.")]
    UnknownCustomerField(String),
    #[error("Invalid period specified. Use 'last_month' or 'this_year'.")]
    InvalidPeriod,
}

/// Failure of a dispatched tool call, after payload validation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{entity} {name} not found.")]
    NotFound { entity: &'static str, name: String },
    #[error("{0}")]
    Backend(String),
}

impl ToolError {
    pub fn not_found(entity: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound { entity, name: name.into() }
    }

    pub fn backend(source: impl std::fmt::Display) -> Self {
        Self::Backend(source.to_string())
    }
}
