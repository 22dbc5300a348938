use std::error::Error;
use std::fmt;
use std::sync::Arc;

use backstop_core::{ApiError, CoreRole, ProjectErrorCatalog, SortedErrorSet};
use serde_json::Value;

use crate::classifier::{Classification, Classifier, Handled, find_cause};

/// One failed constraint on one field
///
/// By convention `message` is the name of the catalog error to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintViolation {
    /// Path of the offending field, e.g. `items[2].count`
    pub field: String,
    /// Name of the violated constraint, e.g. `Positive`
    pub constraint: String,
    /// Catalog error name
    pub message: String,
}

impl ConstraintViolation {
    /// Violation of `constraint` on `field`, reported as the catalog error named by `message`
    pub fn new(field: impl Into<String>, constraint: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            constraint: constraint.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConstraintViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.field, self.constraint, self.message)
    }
}

fn describe(violations: &[ConstraintViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Caller-supplied data failed validation; the caller can fix it
#[derive(Debug, Clone, thiserror::Error)]
#[error("client data failed validation: {}", describe(.violations))]
pub struct ClientDataValidationError {
    /// Type names of the objects that were validated
    pub objects: Vec<String>,
    /// Every violation found
    pub violations: Vec<ConstraintViolation>,
    /// Validation groups that were considered, if any
    pub groups: Vec<String>,
}

impl ClientDataValidationError {
    /// Violations found on a single object of type `T`
    pub fn for_object<T: ?Sized>(violations: Vec<ConstraintViolation>) -> Self {
        Self {
            objects: vec![std::any::type_name::<T>().to_owned()],
            violations,
            groups: Vec::new(),
        }
    }

    /// Record the validation groups that were considered
    #[must_use]
    pub fn with_groups(mut self, groups: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }
}

/// Data exchanged between internal services failed validation
///
/// The caller cannot fix this, so the client only ever sees the generic
/// serverside validation error.
#[derive(Debug, Clone, thiserror::Error)]
#[error("serverside validation failed for {object}: {}", describe(.violations))]
pub struct ServersideValidationError {
    /// Type name of the validated object
    pub object: String,
    /// Every violation found
    pub violations: Vec<ConstraintViolation>,
}

impl ServersideValidationError {
    /// Violations found on an object of type `T`
    pub fn for_object<T: ?Sized>(violations: Vec<ConstraintViolation>) -> Self {
        Self {
            object: std::any::type_name::<T>().to_owned(),
            violations,
        }
    }
}

/// Turns client validation violations into field-tagged catalog errors
#[derive(Debug)]
pub struct ClientDataValidationClassifier {
    catalog: Arc<ProjectErrorCatalog>,
}

impl ClientDataValidationClassifier {
    /// Classifier resolving violation messages against `catalog`
    pub const fn new(catalog: Arc<ProjectErrorCatalog>) -> Self {
        Self { catalog }
    }

    fn convert(&self, violation: &ConstraintViolation) -> ApiError {
        let base = self.catalog.convert_to_api_error(&violation.message).unwrap_or_else(|| {
            tracing::warn!(
                error_name = %violation.message,
                field = %violation.field,
                "validation message does not name a catalog error"
            );
            self.catalog.generic_service_error()
        });
        base.with_metadata([("field", Value::from(violation.field.as_str()))])
    }
}

impl Classifier for ClientDataValidationClassifier {
    fn name(&self) -> &'static str {
        "client_data_validation"
    }

    fn classify(&self, error: &(dyn Error + 'static)) -> Classification {
        let Some(validation) = find_cause::<ClientDataValidationError>(error) else {
            return Classification::Ignore;
        };

        let errors: SortedErrorSet = if validation.violations.is_empty() {
            SortedErrorSet::singleton_of(self.catalog.core(CoreRole::GenericBadRequest).clone())
        } else {
            validation.violations.iter().map(|violation| self.convert(violation)).collect()
        };

        let handled = Handled::new(errors)
            .with_detail("client_data_validation_failed_objects", validation.objects.join(","))
            .with_detail("validation_groups_considered", validation.groups.join(","))
            .with_detail("constraint_violation_details", describe(&validation.violations));

        Classification::Handle(handled)
    }
}

/// Reports the serverside validation core error and logs the full detail
#[derive(Debug)]
pub struct ServersideValidationClassifier {
    catalog: Arc<ProjectErrorCatalog>,
}

impl ServersideValidationClassifier {
    /// Classifier reporting violations as the serverside validation error from `catalog`
    pub const fn new(catalog: Arc<ProjectErrorCatalog>) -> Self {
        Self { catalog }
    }
}

impl Classifier for ServersideValidationClassifier {
    fn name(&self) -> &'static str {
        "serverside_validation"
    }

    fn classify(&self, error: &(dyn Error + 'static)) -> Classification {
        let Some(validation) = find_cause::<ServersideValidationError>(error) else {
            return Classification::Ignore;
        };

        let handled = Handled::single(self.catalog.core(CoreRole::ServersideValidationError).clone())
            .with_detail("serverside_validation_object", validation.object.clone())
            .with_detail("serverside_validation_errors", describe(&validation.violations));

        Classification::Handle(handled)
    }
}
