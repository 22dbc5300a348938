use std::error::Error;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use backstop_classify::{Claimed, ClassifierChain, ClassifierOptions, Handled, StackTraceLogging};
use backstop_core::{ApiError, ProjectErrorCatalog, RequestInfo};
use http::HeaderName;
use uuid::Uuid;

use crate::contract::ErrorContract;
use crate::logging::{RequestLogging, Resolution, log_resolution, render_stack_trace};
use crate::metrics::{ErrorMetrics, Outcome};
use crate::response::{ErrorResponse, build_headers};

/// Status used when resolution itself fails
pub const LAST_DITCH_HTTP_STATUS: u16 = 500;
/// Error code used when resolution itself fails
pub const LAST_DITCH_CODE: &str = "10";
/// Message used when resolution itself fails
pub const LAST_DITCH_MESSAGE: &str = "An error occurred while fulfilling the request";

/// Default name of the header carrying the error id
pub const DEFAULT_ERROR_ID_HEADER: &str = "error_uid";

/// Resolver behaviour that is not part of classification
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Render integer error codes as JSON numbers
    pub render_numeric_codes_as_numbers: bool,
    /// Response header carrying the error id; `None` disables it
    pub error_id_header: Option<HeaderName>,
    /// What request context goes into the resolution log line
    pub request_logging: RequestLogging,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            render_numeric_codes_as_numbers: false,
            error_id_header: Some(HeaderName::from_static(DEFAULT_ERROR_ID_HEADER)),
            request_logging: RequestLogging {
                log_headers: true,
                ..RequestLogging::default()
            },
        }
    }
}

/// Turns any error into an [`ErrorResponse`]
///
/// Resolution never fails: errors nobody recognises get the generic service
/// error, and a failure inside the resolver itself falls back to hardcoded
/// values. Safe to share between threads and call concurrently.
pub struct ErrorResolver {
    catalog: Arc<ProjectErrorCatalog>,
    chain: ClassifierChain,
    options: ResolverOptions,
    metrics: ErrorMetrics,
}

impl ErrorResolver {
    /// Resolver running `chain` against `catalog`
    pub fn new(catalog: Arc<ProjectErrorCatalog>, chain: ClassifierChain, options: ResolverOptions) -> Self {
        Self {
            catalog,
            chain,
            options,
            metrics: ErrorMetrics::global(),
        }
    }

    /// Resolver using the built-in classifier chain
    pub fn standard(
        catalog: Arc<ProjectErrorCatalog>,
        options: ResolverOptions,
        classifier_options: ClassifierOptions,
    ) -> Self {
        let chain = ClassifierChain::standard(&catalog, classifier_options);
        Self::new(catalog, chain, options)
    }

    /// Catalog the resolver ranks and renders errors from
    pub fn catalog(&self) -> &ProjectErrorCatalog {
        &self.catalog
    }

    /// Classifiers consulted in order
    pub const fn chain(&self) -> &ClassifierChain {
        &self.chain
    }

    /// Options the resolver was built with
    pub const fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Resolve `error` raised while serving `request`
    pub fn resolve(&self, error: &(dyn Error + 'static), request: &RequestInfo) -> ErrorResponse {
        panic::catch_unwind(AssertUnwindSafe(|| self.try_resolve(error, request)))
            .unwrap_or_else(|_| self.last_ditch(error, request))
    }

    fn try_resolve(&self, error: &(dyn Error + 'static), request: &RequestInfo) -> ErrorResponse {
        let claimed = panic::catch_unwind(AssertUnwindSafe(|| self.chain.classify(error))).unwrap_or_else(|_| {
            tracing::error!("classifier panicked, treating the error as unhandled");
            None
        });

        if let Some(Claimed { classifier, mut handled }) = claimed {
            match self
                .catalog
                .determine_highest_priority_http_status_code(&handled.errors)
            {
                Some(status) => {
                    handled.errors = ProjectErrorCatalog::sublist_with_http_status_code(&handled.errors, status);
                    return self.respond(Outcome::Handled, Some(classifier), status, &handled, error, request);
                }
                None => {
                    tracing::warn!(
                        classifier,
                        errors = %handled.errors.names().join(","),
                        "classification has no usable HTTP status, treating the error as unhandled"
                    );
                    return self.unhandled(handled.log_details, error, request);
                }
            }
        }

        self.unhandled(Vec::new(), error, request)
    }

    /// Generic service error, keeping whatever details a classifier already gathered
    fn unhandled(
        &self,
        log_details: Vec<(String, String)>,
        error: &(dyn Error + 'static),
        request: &RequestInfo,
    ) -> ErrorResponse {
        let generic = self.catalog.generic_service_error().clone();
        let status = generic.http_status_code();
        let mut handled = Handled::single(generic).with_stack_trace(StackTraceLogging::Force);
        handled.log_details = log_details;
        self.respond(Outcome::Unhandled, None, status, &handled, error, request)
    }

    fn respond(
        &self,
        outcome: Outcome,
        classifier: Option<&'static str>,
        http_status_code: u16,
        handled: &Handled,
        error: &(dyn Error + 'static),
        request: &RequestInfo,
    ) -> ErrorResponse {
        let error_id = Uuid::new_v4();

        let resolution = Resolution {
            error_id,
            http_status_code,
            outcome,
            classifier,
            errors: &handled.errors,
            details: &handled.log_details,
            stack_trace: handled.stack_trace.should_log(http_status_code),
        };
        log_resolution(&resolution, error, request, &self.options.request_logging);
        self.metrics.record(http_status_code, outcome);

        ErrorResponse {
            http_status_code,
            contract: ErrorContract::new(
                error_id,
                &handled.errors,
                self.options.render_numeric_codes_as_numbers,
            ),
            headers: build_headers(&handled.headers, error_id, self.options.error_id_header.as_ref()),
        }
    }

    fn last_ditch(&self, error: &(dyn Error + 'static), request: &RequestInfo) -> ErrorResponse {
        let error_id = Uuid::new_v4();
        let rendered = panic::catch_unwind(AssertUnwindSafe(|| render_stack_trace(error)))
            .unwrap_or_else(|_| "<error could not be rendered>".to_owned());

        tracing::error!(
            error_id = %error_id,
            method = %request.method,
            path = request.path(),
            outcome = Outcome::LastDitch.as_str(),
            stack_trace = %rendered,
            "error resolution failed, responding with the last-ditch error"
        );
        self.metrics.record(LAST_DITCH_HTTP_STATUS, Outcome::LastDitch);

        let fallback = ApiError::new(
            "GENERIC_SERVICE_ERROR",
            LAST_DITCH_CODE,
            LAST_DITCH_MESSAGE,
            LAST_DITCH_HTTP_STATUS,
        );
        ErrorResponse {
            http_status_code: LAST_DITCH_HTTP_STATUS,
            contract: ErrorContract::new(error_id, [&fallback], false),
            headers: build_headers(&[], error_id, self.options.error_id_header.as_ref()),
        }
    }
}

impl std::fmt::Debug for ErrorResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorResolver")
            .field("chain", &self.chain)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
