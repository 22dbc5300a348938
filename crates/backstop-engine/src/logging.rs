use std::error::Error;
use std::fmt::Write as _;

use backstop_core::{HeaderRedaction, RequestInfo, SortedErrorSet};
use uuid::Uuid;

use crate::metrics::Outcome;

/// Everything written to the log line for one resolution
pub struct Resolution<'a> {
    pub error_id: Uuid,
    pub http_status_code: u16,
    pub outcome: Outcome,
    pub classifier: Option<&'static str>,
    pub errors: &'a SortedErrorSet,
    pub details: &'a [(String, String)],
    pub stack_trace: bool,
}

/// Request header rendering policy for log lines
#[derive(Debug, Clone, Default)]
pub struct RequestLogging {
    /// Include request headers at all
    pub log_headers: bool,
    /// Headers masked when they are included
    pub redaction: HeaderRedaction,
}

/// Cause chain followed by the debug rendering of the outermost error
pub fn render_stack_trace(error: &(dyn Error + 'static)) -> String {
    let mut rendered = error.to_string();
    for cause in std::iter::successors(error.source(), |&cause| cause.source()) {
        let _ = write!(rendered, "\n  caused by: {cause}");
    }
    let _ = write!(rendered, "\n{error:?}");
    rendered
}

fn render_details(details: &[(String, String)]) -> String {
    details
        .iter()
        .map(|(key, value)| format!("{key}=\"{value}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Write the log line for a resolution
///
/// Server errors and anything not handled log at `error`, the rest at `warn`.
pub fn log_resolution(
    resolution: &Resolution<'_>,
    error: &(dyn Error + 'static),
    request: &RequestInfo,
    logging: &RequestLogging,
) {
    let error_names = resolution.errors.names().join(",");
    let details = render_details(resolution.details);
    let headers = if logging.log_headers {
        logging.redaction.render(&request.headers)
    } else {
        String::new()
    };
    let stack_trace = if resolution.stack_trace {
        render_stack_trace(error)
    } else {
        String::new()
    };

    if resolution.http_status_code >= 500 || resolution.outcome != Outcome::Handled {
        tracing::error!(
            error_id = %resolution.error_id,
            http_status_code = resolution.http_status_code,
            outcome = resolution.outcome.as_str(),
            classifier = resolution.classifier.unwrap_or("none"),
            errors = %error_names,
            details = %details,
            method = %request.method,
            path = request.path(),
            query = request.query().unwrap_or_default(),
            headers = %headers,
            stack_trace = %stack_trace,
            "{error}"
        );
    } else {
        tracing::warn!(
            error_id = %resolution.error_id,
            http_status_code = resolution.http_status_code,
            outcome = resolution.outcome.as_str(),
            classifier = resolution.classifier.unwrap_or("none"),
            errors = %error_names,
            details = %details,
            method = %request.method,
            path = request.path(),
            query = request.query().unwrap_or_default(),
            headers = %headers,
            stack_trace = %stack_trace,
            "{error}"
        );
    }
}
