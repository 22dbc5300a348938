//! Baseline errors every service ships, independent of its own domain

use serde::{Deserialize, Serialize};
use strum::{EnumCount, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::ApiError;

const GENERIC_MESSAGE: &str = "An error occurred while fulfilling the request";
const TEMPORARY_MESSAGE: &str = "A temporary error occurred. The request can be retried";

/// Semantic role of a core error
///
/// The role name doubles as the error's [`ApiError::name`]. Codes, messages
/// and statuses are project-configurable through [`CoreErrors::replace`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumCount,
    EnumIter,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoreRole {
    /// Catch-all for anything the service cannot describe more precisely
    GenericServiceError,
    /// A downstream dependency failed in a way retrying will not fix
    OutsideDependencyReturnedAnUnrecoverableError,
    /// Data exchanged between internal services failed validation
    ServersideValidationError,
    /// Transient failure, the caller may retry
    TemporaryServiceProblem,
    /// A downstream dependency reported a transient failure
    OutsideDependencyReturnedATemporaryError,
    /// Request is invalid in a way no more specific error covers
    GenericBadRequest,
    /// Request body was expected but absent
    MissingExpectedContent,
    /// A request value could not be converted to the required type
    TypeConversionError,
    /// Request body could not be parsed
    MalformedRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    NoAcceptableRepresentation,
    UnsupportedMediaType,
    TooManyRequests,
}

impl CoreRole {
    /// Name of the error filling this role
    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Baseline error for this role
    pub fn default_error(self) -> ApiError {
        let (code, message, status) = match self {
            Self::GenericServiceError
            | Self::OutsideDependencyReturnedAnUnrecoverableError
            | Self::ServersideValidationError => ("10", GENERIC_MESSAGE, 500),
            Self::TemporaryServiceProblem | Self::OutsideDependencyReturnedATemporaryError => {
                ("20", TEMPORARY_MESSAGE, 503)
            }
            Self::GenericBadRequest => ("30", "Invalid request", 400),
            Self::MissingExpectedContent => ("40", "Missing expected content", 400),
            Self::TypeConversionError => ("50", "Type conversion error", 400),
            Self::MalformedRequest => ("60", "Malformed request", 400),
            Self::Unauthorized => ("70", "Unauthorized access", 401),
            Self::Forbidden => ("80", "Forbidden access", 403),
            Self::NotFound => ("90", "The requested resource was not found", 404),
            Self::MethodNotAllowed => ("100", "Http method not allowed", 405),
            Self::NoAcceptableRepresentation => ("110", "No acceptable representation for this resource", 406),
            Self::UnsupportedMediaType => ("120", "Unsupported media type", 415),
            Self::TooManyRequests => ("130", "Too many requests", 429),
        };

        ApiError::new(self.name(), code, message, status)
    }
}

/// Complete set of core errors, one per [`CoreRole`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreErrors {
    // indexed by `CoreRole as usize`, always `CoreRole::COUNT` long
    errors: Vec<ApiError>,
}

impl Default for CoreErrors {
    fn default() -> Self {
        Self {
            errors: CoreRole::iter().map(CoreRole::default_error).collect(),
        }
    }
}

impl CoreErrors {
    /// Error filling `role`
    pub fn get(&self, role: CoreRole) -> &ApiError {
        &self.errors[role as usize]
    }

    /// Replace the code, message and status of the error filling `role`
    ///
    /// The name stays the role name so lookups keep working.
    pub fn replace(
        &mut self,
        role: CoreRole,
        error_code: impl Into<String>,
        message: impl Into<String>,
        http_status_code: u16,
    ) {
        self.errors[role as usize] = ApiError::new(role.name(), error_code, message, http_status_code);
    }

    /// Iterate over every role and its error, in role order
    pub fn iter(&self) -> impl Iterator<Item = (CoreRole, &ApiError)> {
        CoreRole::iter().zip(self.errors.iter())
    }

    /// Whether `error` is exactly one of the core errors
    pub fn contains(&self, error: &ApiError) -> bool {
        self.errors.iter().any(|core| core == error)
    }

    /// Number of core errors
    pub const fn len(&self) -> usize {
        CoreRole::COUNT
    }

    /// Always `false`; present for API symmetry with `len`
    pub const fn is_empty(&self) -> bool {
        false
    }
}
