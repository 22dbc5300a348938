//! Metric names and the counter the resolver records into

use opentelemetry::KeyValue;
use opentelemetry::metrics::Counter;

/// Errors resolved, by HTTP status and outcome
pub const ERRORS_RESOLVED: &str = "backstop.errors.resolved";

pub const ATTR_STATUS_CODE: &str = "http.response.status_code";
pub const ATTR_OUTCOME: &str = "backstop.outcome";

/// How a resolution ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A classifier claimed the error
    Handled,
    /// Nothing claimed the error, or the claim could not be resolved
    Unhandled,
    /// The resolver itself failed and hardcoded values were used
    LastDitch,
}

impl Outcome {
    /// Value of the outcome attribute and log field
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Handled => "handled",
            Self::Unhandled => "unhandled",
            Self::LastDitch => "last_ditch",
        }
    }
}

/// Instruments owned by an [`ErrorResolver`](crate::ErrorResolver)
#[derive(Debug, Clone)]
pub struct ErrorMetrics {
    resolved: Counter<u64>,
}

impl ErrorMetrics {
    /// Instruments on the global meter provider; a no-op until one is installed
    pub fn global() -> Self {
        let meter = opentelemetry::global::meter("backstop");
        Self {
            resolved: meter
                .u64_counter(ERRORS_RESOLVED)
                .with_description("Errors resolved into an error contract")
                .build(),
        }
    }

    /// Count one resolution by status and outcome
    pub fn record(&self, http_status_code: u16, outcome: Outcome) {
        self.resolved.add(
            1,
            &[
                KeyValue::new(ATTR_STATUS_CODE, i64::from(http_status_code)),
                KeyValue::new(ATTR_OUTCOME, outcome.as_str()),
            ],
        );
    }
}
