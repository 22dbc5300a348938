//! TOML configuration for Backstop
//!
//! A single file declares the handler options, the project error catalog and
//! telemetry. `{{ env.NAME }}` placeholders are expanded before parsing.

#![allow(clippy::must_use_candidate)]

pub mod catalog;
mod env;
pub mod handler;
mod loader;
pub mod telemetry;

use std::sync::Arc;

use backstop_core::ProjectErrorCatalog;
use backstop_engine::ErrorResolver;
use serde::Deserialize;

pub use catalog::{CatalogConfig, CoreOverride, ErrorDeclaration};
pub use handler::HandlerConfig;
pub use telemetry::TelemetryConfig;

/// Top-level Backstop configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Error handler behaviour
    #[serde(default)]
    pub handler: HandlerConfig,
    /// Project error catalog
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Telemetry configuration
    #[serde(default)]
    pub telemetry: Option<TelemetryConfig>,
}

impl Config {
    /// Build the project error catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the declared errors violate a catalog invariant
    pub fn build_catalog(&self) -> anyhow::Result<ProjectErrorCatalog> {
        self.catalog.build()
    }

    /// Build the catalog and a resolver with the standard classifier chain
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog is invalid or the error id header
    /// cannot be used as a header name
    pub fn resolver(&self) -> anyhow::Result<ErrorResolver> {
        let catalog = Arc::new(self.build_catalog()?);
        Ok(ErrorResolver::standard(
            catalog,
            self.handler.resolver_options()?,
            self.handler.classifier_options(),
        ))
    }
}
