use std::error::Error;
use std::sync::Arc;

use backstop_core::{ApiError, CoreRole, ProjectErrorCatalog, SortedErrorSet};

use crate::classifier::{BoxError, Classification, Classifier, Handled, StackTraceLogging, find_cause};

/// Error raised by application code that already knows which catalog errors
/// the client should see
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiException {
    errors: Vec<ApiError>,
    log_details: Vec<(String, String)>,
    headers: Vec<(String, Vec<String>)>,
    stack_trace: StackTraceLogging,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl ApiException {
    /// Start building an exception
    pub fn builder() -> ApiExceptionBuilder {
        ApiExceptionBuilder::default()
    }

    /// Exception carrying a single error and nothing else
    pub fn from_error(error: ApiError) -> Self {
        Self::builder().error(error).build()
    }

    /// Errors to report
    pub fn errors(&self) -> &[ApiError] {
        &self.errors
    }

    /// Extra diagnostic details
    pub fn log_details(&self) -> &[(String, String)] {
        &self.log_details
    }

    /// Extra response headers
    pub fn headers(&self) -> &[(String, Vec<String>)] {
        &self.headers
    }

    /// Stack trace logging preference
    pub const fn stack_trace(&self) -> StackTraceLogging {
        self.stack_trace
    }

    /// Internal message; never shown to the client
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Builder for [`ApiException`]
#[derive(Debug, Default)]
pub struct ApiExceptionBuilder {
    errors: Vec<ApiError>,
    log_details: Vec<(String, String)>,
    headers: Vec<(String, Vec<String>)>,
    stack_trace: StackTraceLogging,
    message: Option<String>,
    source: Option<BoxError>,
}

impl ApiExceptionBuilder {
    /// Add an error to report
    #[must_use]
    pub fn error(mut self, error: ApiError) -> Self {
        self.errors.push(error);
        self
    }

    /// Add several errors to report
    #[must_use]
    pub fn errors(mut self, errors: impl IntoIterator<Item = ApiError>) -> Self {
        self.errors.extend(errors);
        self
    }

    /// Add a diagnostic detail
    #[must_use]
    pub fn log_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.log_details.push((key.into(), value.into()));
        self
    }

    /// Add a response header
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.headers
            .push((name.into(), values.into_iter().map(Into::into).collect()));
        self
    }

    /// Override the stack trace logging preference
    #[must_use]
    pub const fn stack_trace(mut self, stack_trace: StackTraceLogging) -> Self {
        self.stack_trace = stack_trace;
        self
    }

    /// Set the internal message
    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach the underlying cause
    #[must_use]
    pub fn source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Finish the exception
    ///
    /// Without an explicit message the error names are used, so the log line
    /// still says what was reported.
    pub fn build(self) -> ApiException {
        let message = self.message.unwrap_or_else(|| {
            self.errors
                .iter()
                .map(ApiError::name)
                .collect::<Vec<_>>()
                .join(", ")
        });

        ApiException {
            errors: self.errors,
            log_details: self.log_details,
            headers: self.headers,
            stack_trace: self.stack_trace,
            message,
            source: self.source,
        }
    }
}

/// Passes through whatever an [`ApiException`] carries
#[derive(Debug)]
pub struct ApiExceptionClassifier {
    catalog: Arc<ProjectErrorCatalog>,
}

impl ApiExceptionClassifier {
    /// Classifier backed by `catalog`
    pub const fn new(catalog: Arc<ProjectErrorCatalog>) -> Self {
        Self { catalog }
    }
}

impl Classifier for ApiExceptionClassifier {
    fn name(&self) -> &'static str {
        "api_exception"
    }

    fn classify(&self, error: &(dyn Error + 'static)) -> Classification {
        let Some(exception) = find_cause::<ApiException>(error) else {
            return Classification::Ignore;
        };

        let errors = if exception.errors.is_empty() {
            tracing::warn!(
                exception_message = %exception.message,
                "ApiException raised without any errors, reporting the generic service error"
            );
            SortedErrorSet::singleton_of(self.catalog.core(CoreRole::GenericServiceError).clone())
        } else {
            exception.errors.iter().cloned().collect()
        };

        let mut handled = Handled::new(errors).with_stack_trace(exception.stack_trace);
        handled.log_details.extend(exception.log_details.iter().cloned());
        handled
            .log_details
            .push(("api_exception_message".to_owned(), exception.message.clone()));
        handled.headers.extend(exception.headers.iter().cloned());

        Classification::Handle(handled)
    }
}
