use std::error::Error;
use std::fmt;
use std::sync::Arc;

use backstop_core::{CoreRole, ProjectErrorCatalog};

use crate::classifier::{BoxError, Classification, Classifier, ClassifierOptions, Handled, find_cause};

/// How a call to another service failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownstreamFailure {
    /// Connection could not be established in time
    ConnectTimeout,
    /// Connection was established but a read or write timed out
    SocketTimeout,
    /// Host refused or could not be reached
    Unreachable,
    /// Overall call deadline elapsed
    Timeout,
    /// Downstream answered with an HTTP status
    HttpStatus {
        status: u16,
        body: Option<String>,
    },
    /// Downstream answered with a status that could not be parsed
    UnknownStatus {
        raw_status: String,
        body: Option<String>,
    },
    /// Anything else, e.g. a response that could not be decoded
    Other {
        reason: String,
    },
}

impl DownstreamFailure {
    /// Whether this failure is a timeout or a connection problem
    pub const fn is_transient_network_failure(&self) -> bool {
        matches!(
            self,
            Self::ConnectTimeout | Self::SocketTimeout | Self::Unreachable | Self::Timeout
        )
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::ConnectTimeout => "connect_timeout",
            Self::SocketTimeout => "socket_timeout",
            Self::Unreachable => "unreachable",
            Self::Timeout => "timeout",
            Self::HttpStatus { .. } => "http_status",
            Self::UnknownStatus { .. } => "unknown_status",
            Self::Other { .. } => "other",
        }
    }

    fn body(&self) -> Option<&str> {
        match self {
            Self::HttpStatus { body, .. } | Self::UnknownStatus { body, .. } => body.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for DownstreamFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectTimeout => f.write_str("connect timed out"),
            Self::SocketTimeout => f.write_str("socket timed out"),
            Self::Unreachable => f.write_str("host unreachable"),
            Self::Timeout => f.write_str("call timed out"),
            Self::HttpStatus { status, .. } => write!(f, "returned HTTP {status}"),
            Self::UnknownStatus { raw_status, .. } => write!(f, "returned unrecognised status {raw_status:?}"),
            Self::Other { reason } => f.write_str(reason),
        }
    }
}

/// A call to another service failed
#[derive(Debug, thiserror::Error)]
#[error("call to {service} failed: {failure}")]
pub struct DownstreamError {
    /// Name of the downstream service, logged as the connection type
    pub service: String,
    /// What went wrong
    pub failure: DownstreamFailure,
    #[source]
    source: Option<BoxError>,
}

impl DownstreamError {
    /// Failure talking to `service`
    pub fn new(service: impl Into<String>, failure: DownstreamFailure) -> Self {
        Self {
            service: service.into(),
            failure,
            source: None,
        }
    }

    /// Downstream answered with `status`
    pub fn http_status(service: impl Into<String>, status: u16, body: Option<String>) -> Self {
        Self::new(service, DownstreamFailure::HttpStatus { status, body })
    }

    /// Attach the transport error that caused this failure
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Map a `reqwest` transport error onto a failure kind
    #[cfg(feature = "reqwest")]
    pub fn from_reqwest(service: impl Into<String>, error: reqwest::Error) -> Self {
        let failure = if error.is_connect() {
            if error.is_timeout() {
                DownstreamFailure::ConnectTimeout
            } else {
                DownstreamFailure::Unreachable
            }
        } else if error.is_timeout() {
            DownstreamFailure::Timeout
        } else if let Some(status) = error.status() {
            DownstreamFailure::HttpStatus {
                status: status.as_u16(),
                body: None,
            }
        } else {
            DownstreamFailure::Other {
                reason: error.to_string(),
            }
        };

        Self::new(service, failure).with_source(error)
    }
}

/// Maps downstream failures to the temporary or unrecoverable core errors
#[derive(Debug)]
pub struct DownstreamNetworkClassifier {
    catalog: Arc<ProjectErrorCatalog>,
    options: ClassifierOptions,
}

impl DownstreamNetworkClassifier {
    /// Classifier mapping downstream failures onto `catalog` core errors
    pub const fn new(catalog: Arc<ProjectErrorCatalog>, options: ClassifierOptions) -> Self {
        Self { catalog, options }
    }

    fn role_for(&self, failure: &DownstreamFailure) -> CoreRole {
        match failure {
            failure if failure.is_transient_network_failure() => CoreRole::TemporaryServiceProblem,
            DownstreamFailure::HttpStatus { status: 429, .. } if self.options.propagate_downstream_too_many_requests => {
                CoreRole::TooManyRequests
            }
            DownstreamFailure::HttpStatus { status: 503, .. } => CoreRole::OutsideDependencyReturnedATemporaryError,
            _ => CoreRole::OutsideDependencyReturnedAnUnrecoverableError,
        }
    }
}

impl Classifier for DownstreamNetworkClassifier {
    fn name(&self) -> &'static str {
        "downstream_network"
    }

    fn classify(&self, error: &(dyn Error + 'static)) -> Classification {
        let Some(downstream) = find_cause::<DownstreamError>(error) else {
            return Classification::Ignore;
        };

        let failure = &downstream.failure;
        let mut handled = Handled::single(self.catalog.core(self.role_for(failure)).clone())
            .with_detail("connection_type", downstream.service.clone());

        handled = match failure {
            DownstreamFailure::HttpStatus { status, .. } => handled.with_detail("downstream_status", status.to_string()),
            DownstreamFailure::UnknownStatus { raw_status, .. } => {
                handled.with_detail("downstream_raw_status", raw_status.clone())
            }
            other => handled.with_detail("downstream_failure", other.kind()),
        };

        if self.options.log_downstream_response_body
            && let Some(body) = failure.body()
        {
            handled = handled.with_detail("raw_response_string", body);
        }

        Classification::Handle(handled)
    }
}
