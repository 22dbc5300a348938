//! Programmatic configuration builder for integration tests

use backstop_config::{Config, ErrorDeclaration};

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Orders service catalog with the default handler options
    pub fn new() -> Self {
        let mut config = Config::default();
        config.catalog.status_code_priority_order = vec![403, 401, 503, 500, 429, 409, 400, 405, 404, 415, 406];
        config.catalog.range = backstop_core::ErrorCodeRange::Integer {
            start: 99100,
            end: 99199,
        };
        config.catalog.errors = vec![
            declaration("ORDER_LOCKED", "99100", "Order is locked", 409),
            declaration("INVALID_COUNT_VALUE", "99101", "count must be positive", 400),
            declaration("SKU_REQUIRED", "99102", "sku is required", 400),
        ];

        Self { config }
    }

    /// Render integer codes as JSON numbers
    pub fn with_numeric_codes(mut self) -> Self {
        self.config.handler.render_numeric_codes_as_numbers = true;
        self
    }

    /// Use a different error id header, empty disables it
    pub fn with_error_id_header(mut self, name: &str) -> Self {
        name.clone_into(&mut self.config.handler.error_id_header);
        self
    }

    /// Treat a downstream 429 as an unrecoverable dependency failure
    pub fn without_too_many_requests_propagation(mut self) -> Self {
        self.config.handler.propagate_downstream_too_many_requests = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}

fn declaration(name: &str, code: &str, message: &str, http_status_code: u16) -> ErrorDeclaration {
    ErrorDeclaration {
        name: name.to_owned(),
        code: code.to_owned(),
        message: message.to_owned(),
        http_status_code,
        metadata: backstop_core::Metadata::new(),
    }
}
