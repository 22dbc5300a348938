use std::error::Error;
use std::fmt;
use std::sync::Arc;

use backstop_core::{CoreRole, ProjectErrorCatalog, SortedErrorSet};
use serde_json::Value;

use crate::classifier::{BoxError, Classification, Classifier, Handled, find_cause};
use crate::type_names::coarse_type_name;

const MISSING_BODY_MESSAGES: [&str; 2] = ["request body is missing", "EOF while parsing a value at line 1 column 0"];

/// Where a request parameter was expected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterLocation {
    /// URL query string
    Query,
    /// Templated path segment
    Path,
    /// Request header
    Header,
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Query => "query",
            Self::Path => "path",
            Self::Header => "header",
        })
    }
}

/// A field that failed the web framework's own validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field path
    pub field: String,
    /// Default message; by convention a catalog error name
    pub message: String,
}

impl FieldError {
    /// Failure on `field` carrying `message`
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failures raised by the web framework itself, before or around the handler
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("no route matches the request")]
    NotFound,

    #[error("method {method} is not allowed")]
    MethodNotAllowed {
        method: String,
        /// Methods the route does accept, sent back in `Allow`
        allowed: Vec<String>,
    },

    #[error("unsupported content type {}", .content_type.as_deref().unwrap_or("<none>"))]
    UnsupportedMediaType { content_type: Option<String> },

    #[error("no acceptable representation")]
    NotAcceptable,

    #[error("authentication required")]
    Unauthorized,

    #[error("access denied")]
    Forbidden,

    #[error("missing {location} parameter {name}")]
    MissingParameter {
        name: String,
        location: ParameterLocation,
        /// Type the parameter would have been converted to, as `std::any::type_name` renders it
        required_type: String,
    },

    #[error("cannot convert {property}={value:?} to {required_type}")]
    TypeMismatch {
        property: String,
        value: String,
        required_type: String,
    },

    #[error("request body unreadable: {message}")]
    BodyUnreadable {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("{} field(s) failed validation", .0.len())]
    FieldValidation(Vec<FieldError>),
}

impl FrameworkError {
    /// Body could not be read or parsed; `source` is the parse error
    ///
    /// The message joins every error in the source chain, since body parsers
    /// often bury the interesting part a few causes down.
    pub fn body_unreadable(source: impl Into<BoxError>) -> Self {
        let source = source.into();
        let message = std::iter::successors(Some(&*source as &(dyn Error + 'static)), |&cause| cause.source())
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(": ");
        Self::BodyUnreadable {
            message,
            source: Some(source),
        }
    }

    /// Type mismatch where the required type is given by `T`
    pub fn type_mismatch<T: ?Sized>(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self::TypeMismatch {
            property: property.into(),
            value: value.into(),
            required_type: std::any::type_name::<T>().to_owned(),
        }
    }

    /// Missing parameter whose type is given by `T`
    pub fn missing_parameter<T: ?Sized>(name: impl Into<String>, location: ParameterLocation) -> Self {
        Self::MissingParameter {
            name: name.into(),
            location,
            required_type: std::any::type_name::<T>().to_owned(),
        }
    }
}

/// Whether an unreadable body was actually absent rather than malformed
///
/// Body parsers do not report "no body" as a distinct error, so this matches
/// known messages first and then looks for an empty-input JSON error.
fn is_missing_body(message: &str, source: Option<&(dyn Error + 'static)>) -> bool {
    if MISSING_BODY_MESSAGES.iter().any(|needle| message.contains(needle)) {
        return true;
    }

    source
        .and_then(find_cause::<serde_json::Error>)
        .is_some_and(|json| json.is_eof() && json.line() == 1 && json.column() == 0)
}

/// Maps [`FrameworkError`] variants onto their core errors
#[derive(Debug)]
pub struct FrameworkClassifier {
    catalog: Arc<ProjectErrorCatalog>,
}

impl FrameworkClassifier {
    /// Classifier mapping framework failures onto `catalog` core errors
    pub const fn new(catalog: Arc<ProjectErrorCatalog>) -> Self {
        Self { catalog }
    }

    fn core(&self, role: CoreRole) -> Handled {
        Handled::single(self.catalog.core(role).clone())
    }
}

impl Classifier for FrameworkClassifier {
    fn name(&self) -> &'static str {
        "framework"
    }

    fn classify(&self, error: &(dyn Error + 'static)) -> Classification {
        let Some(framework) = find_cause::<FrameworkError>(error) else {
            return Classification::Ignore;
        };

        let handled = match framework {
            FrameworkError::NotFound => self.core(CoreRole::NotFound),
            FrameworkError::MethodNotAllowed { method, allowed } => {
                let handled = self
                    .core(CoreRole::MethodNotAllowed)
                    .with_detail("method", method.clone());
                if allowed.is_empty() {
                    handled
                } else {
                    handled.with_header("allow", vec![allowed.join(", ")])
                }
            }
            FrameworkError::UnsupportedMediaType { content_type } => self
                .core(CoreRole::UnsupportedMediaType)
                .with_detail("content_type", content_type.clone().unwrap_or_default()),
            FrameworkError::NotAcceptable => self.core(CoreRole::NoAcceptableRepresentation),
            FrameworkError::Unauthorized => self.core(CoreRole::Unauthorized),
            FrameworkError::Forbidden => self.core(CoreRole::Forbidden),
            FrameworkError::MissingParameter {
                name,
                location,
                required_type,
            } => {
                let error = self.catalog.core(CoreRole::MalformedRequest).with_metadata([
                    ("missing_param_name", Value::from(name.as_str())),
                    ("missing_param_type", Value::from(coarse_type_name(required_type))),
                ]);
                Handled::single(error).with_detail("missing_param_location", location.to_string())
            }
            FrameworkError::TypeMismatch {
                property,
                value,
                required_type,
            } => {
                let error = self.catalog.core(CoreRole::TypeConversionError).with_metadata([
                    ("bad_property_name", Value::from(property.as_str())),
                    ("bad_property_value", Value::from(value.as_str())),
                    ("required_type", Value::from(coarse_type_name(required_type))),
                ]);
                Handled::single(error).with_detail("required_type_full", required_type.clone())
            }
            FrameworkError::BodyUnreadable { message, source } => {
                let source = source.as_deref().map(|source| source as &(dyn Error + 'static));
                let role = if is_missing_body(message, source) {
                    CoreRole::MissingExpectedContent
                } else {
                    CoreRole::MalformedRequest
                };
                self.core(role).with_detail("body_error", message.clone())
            }
            FrameworkError::BadRequest { message } => self
                .core(CoreRole::GenericBadRequest)
                .with_detail("bad_request_reason", message.clone()),
            // Left to the field validation classifier
            FrameworkError::FieldValidation(_) => return Classification::Ignore,
        };

        Classification::Handle(handled)
    }
}

/// Converts framework field errors into field-tagged catalog errors
#[derive(Debug)]
pub struct FieldValidationClassifier {
    catalog: Arc<ProjectErrorCatalog>,
}

impl FieldValidationClassifier {
    /// Classifier resolving field messages against `catalog`
    pub const fn new(catalog: Arc<ProjectErrorCatalog>) -> Self {
        Self { catalog }
    }
}

impl Classifier for FieldValidationClassifier {
    fn name(&self) -> &'static str {
        "field_validation"
    }

    fn classify(&self, error: &(dyn Error + 'static)) -> Classification {
        let Some(FrameworkError::FieldValidation(fields)) = find_cause::<FrameworkError>(error) else {
            return Classification::Ignore;
        };

        let errors: SortedErrorSet = if fields.is_empty() {
            SortedErrorSet::singleton_of(self.catalog.core(CoreRole::GenericBadRequest).clone())
        } else {
            fields
                .iter()
                .map(|field| {
                    self.catalog
                        .convert_to_api_error_or(&field.message, self.catalog.generic_service_error())
                        .with_metadata([("field", Value::from(field.field.as_str()))])
                })
                .collect()
        };

        let summary = fields
            .iter()
            .map(|field| format!("{}|{}", field.field, field.message))
            .collect::<Vec<_>>()
            .join(", ");

        Classification::Handle(Handled::new(errors).with_detail("field_validation_errors", summary))
    }
}
