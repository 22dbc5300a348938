use backstop_classify::ClassifierOptions;
use backstop_core::{HeaderRedaction, NameOrPattern};
use backstop_engine::{DEFAULT_ERROR_ID_HEADER, RequestLogging, ResolverOptions};
use http::HeaderName;
use serde::Deserialize;

/// Error handler behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlerConfig {
    /// Render integer error codes as JSON numbers
    #[serde(default)]
    pub render_numeric_codes_as_numbers: bool,
    /// Forward a downstream 429 as 429 instead of an unrecoverable error
    #[serde(default = "default_true")]
    pub propagate_downstream_too_many_requests: bool,
    /// Log downstream response bodies
    #[serde(default = "default_true")]
    pub log_downstream_response_body: bool,
    /// Header carrying the error id; empty disables it
    #[serde(default = "default_error_id_header")]
    pub error_id_header: String,
    /// Include request headers in error logs
    #[serde(default = "default_true")]
    pub log_request_headers: bool,
    /// Extra headers to mask in error logs, by name or regex
    #[serde(default)]
    pub redacted_headers: Vec<NameOrPattern>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            render_numeric_codes_as_numbers: false,
            propagate_downstream_too_many_requests: true,
            log_downstream_response_body: true,
            error_id_header: default_error_id_header(),
            log_request_headers: true,
            redacted_headers: Vec::new(),
        }
    }
}

impl HandlerConfig {
    /// Parsed error id header, `None` when disabled
    ///
    /// # Errors
    ///
    /// Returns an error if the configured name is not a valid header name
    pub fn error_id_header(&self) -> anyhow::Result<Option<HeaderName>> {
        if self.error_id_header.is_empty() {
            return Ok(None);
        }
        let name = HeaderName::try_from(self.error_id_header.as_str())
            .map_err(|e| anyhow::anyhow!("invalid handler.error_id_header '{}': {e}", self.error_id_header))?;
        Ok(Some(name))
    }

    /// Options for the resolver
    ///
    /// # Errors
    ///
    /// Returns an error if the error id header name is invalid
    pub fn resolver_options(&self) -> anyhow::Result<ResolverOptions> {
        Ok(ResolverOptions {
            render_numeric_codes_as_numbers: self.render_numeric_codes_as_numbers,
            error_id_header: self.error_id_header()?,
            request_logging: RequestLogging {
                log_headers: self.log_request_headers,
                redaction: HeaderRedaction::new(self.redacted_headers.clone()),
            },
        })
    }

    /// Options for the standard classifiers
    pub const fn classifier_options(&self) -> ClassifierOptions {
        ClassifierOptions {
            propagate_downstream_too_many_requests: self.propagate_downstream_too_many_requests,
            log_downstream_response_body: self.log_downstream_response_body,
        }
    }
}

const fn default_true() -> bool {
    true
}

fn default_error_id_header() -> String {
    DEFAULT_ERROR_ID_HEADER.to_owned()
}
