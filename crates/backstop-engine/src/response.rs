use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use uuid::Uuid;

use crate::contract::ErrorContract;

/// Everything an adapter needs to emit the HTTP response for a resolved error
#[derive(Debug, Clone)]
pub struct ErrorResponse {
    pub http_status_code: u16,
    pub contract: ErrorContract,
    /// Classifier supplied headers plus the error id header
    pub headers: HeaderMap,
}

impl ErrorResponse {
    /// Correlation id shared by the response body and the log line
    pub const fn error_id(&self) -> Uuid {
        self.contract.error_id
    }

    /// Status as an [`http::StatusCode`]; out-of-range codes become 500
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.http_status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Convert classifier headers to a [`HeaderMap`], adding the error id header
///
/// Names or values that are not valid HTTP are dropped with a warning.
pub fn build_headers(
    extra: &[(String, Vec<String>)],
    error_id: Uuid,
    error_id_header: Option<&HeaderName>,
) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for (name, values) in extra {
        let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
            tracing::warn!(header = %name, "dropping response header with an invalid name");
            continue;
        };
        for value in values {
            match HeaderValue::from_str(value) {
                Ok(value) => {
                    headers.append(name.clone(), value);
                }
                Err(_) => tracing::warn!(header = %name, "dropping response header with an invalid value"),
            }
        }
    }

    if let Some(name) = error_id_header
        && let Ok(value) = HeaderValue::from_str(&error_id.to_string())
    {
        headers.insert(name.clone(), value);
    }

    headers
}
