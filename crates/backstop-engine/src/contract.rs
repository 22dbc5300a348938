use backstop_core::{ApiError, Metadata};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response body sent to the client for every resolved error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorContract {
    /// Correlates the response with the server-side log line
    pub error_id: Uuid,
    pub errors: Vec<ContractError>,
}

/// One error in an [`ErrorContract`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractError {
    pub code: ContractCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

/// Error code as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContractCode {
    Number(i64),
    Text(String),
}

impl ContractCode {
    /// Render `code`, as a number only when `numeric` is set and it parses
    pub fn render(code: &str, numeric: bool) -> Self {
        if numeric && let Ok(number) = code.parse() {
            return Self::Number(number);
        }
        Self::Text(code.to_owned())
    }
}

impl ErrorContract {
    /// Build the contract for `errors`, keeping their order
    pub fn new<'a>(
        error_id: Uuid,
        errors: impl IntoIterator<Item = &'a ApiError>,
        render_numeric_codes_as_numbers: bool,
    ) -> Self {
        let errors = errors
            .into_iter()
            .map(|error| ContractError {
                code: ContractCode::render(error.error_code(), render_numeric_codes_as_numbers),
                message: error.message().to_owned(),
                metadata: error.metadata().clone(),
            })
            .collect();

        Self { error_id, errors }
    }
}
