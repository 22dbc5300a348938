use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Client-facing metadata attached to an [`ApiError`]
///
/// Keys are kept sorted so rendering and comparison are deterministic.
pub type Metadata = BTreeMap<String, Value>;

/// Canonical, client-safe description of one error condition
///
/// Two errors are equal only when all five fields match. Catalog errors are
/// static; request-specific context is layered on with [`ApiError::with_metadata`],
/// which leaves the original untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiError {
    name: String,
    error_code: String,
    message: String,
    http_status_code: u16,
    #[serde(skip_serializing_if = "Metadata::is_empty")]
    metadata: Metadata,
}

impl ApiError {
    /// Create an error with empty metadata
    pub fn new(
        name: impl Into<String>,
        error_code: impl Into<String>,
        message: impl Into<String>,
        http_status_code: u16,
    ) -> Self {
        Self {
            name: name.into(),
            error_code: error_code.into(),
            message: message.into(),
            http_status_code,
            metadata: Metadata::new(),
        }
    }

    /// Copy of this error whose metadata is `extra` merged over the current metadata
    ///
    /// Keys in `extra` win on conflict. Every other field is carried over as is,
    /// so an empty `extra` yields a value equal to `self`.
    #[must_use]
    pub fn with_metadata<I, K>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut decorated = self.clone();
        decorated
            .metadata
            .extend(extra.into_iter().map(|(key, value)| (key.into(), value)));
        decorated
    }

    /// Stable identifier, unique within a catalog
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Business error code rendered to clients
    pub fn error_code(&self) -> &str {
        &self.error_code
    }

    /// Human-readable message rendered to clients
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status associated with this error
    pub const fn http_status_code(&self) -> u16 {
        self.http_status_code
    }

    /// Metadata rendered to clients (omitted from the contract when empty)
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Whether `other` describes the same logical error under another name
    ///
    /// Wrappers share error code, message and HTTP status.
    pub fn is_wrapper_of(&self, other: &Self) -> bool {
        self.error_code == other.error_code
            && self.message == other.message
            && self.http_status_code == other.http_status_code
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (code={}, status={})",
            self.name, self.error_code, self.http_status_code
        )
    }
}
