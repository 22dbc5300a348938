use std::collections::BTreeMap;
use std::str::FromStr;

use backstop_core::{
    ApiError, CoreErrors, CoreRole, DEFAULT_STATUS_CODE_PRIORITY_ORDER, ErrorCodeRange, Metadata,
    ProjectErrorCatalog,
};
use serde::Deserialize;

/// Project error catalog declaration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// HTTP statuses from highest to lowest precedence
    #[serde(default = "default_priority_order")]
    pub status_code_priority_order: Vec<u16>,
    /// Codes reserved for project errors
    #[serde(default)]
    pub range: ErrorCodeRange,
    /// Overrides for core errors, keyed by role name
    #[serde(default)]
    pub core: BTreeMap<String, CoreOverride>,
    /// Project-specific errors
    #[serde(default)]
    pub errors: Vec<ErrorDeclaration>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            status_code_priority_order: default_priority_order(),
            range: ErrorCodeRange::default(),
            core: BTreeMap::new(),
            errors: Vec::new(),
        }
    }
}

/// Replacement code, message or status for one core error
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreOverride {
    pub code: Option<String>,
    pub message: Option<String>,
    pub http_status_code: Option<u16>,
}

/// One project-specific error
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ErrorDeclaration {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub message: String,
    pub http_status_code: u16,
    #[serde(default)]
    pub metadata: Metadata,
}

impl ErrorDeclaration {
    fn to_api_error(&self) -> ApiError {
        ApiError::new(&*self.name, &*self.code, &*self.message, self.http_status_code)
            .with_metadata(self.metadata.clone())
    }
}

impl CatalogConfig {
    /// Core errors with the configured overrides applied
    ///
    /// # Errors
    ///
    /// Returns an error if an override names an unknown core role
    pub fn core_errors(&self) -> anyhow::Result<CoreErrors> {
        let mut core = CoreErrors::default();
        for (name, overrides) in &self.core {
            let role = core_role(name)?;
            let current = core.get(role).clone();
            core.replace(
                role,
                overrides.code.as_deref().unwrap_or(current.error_code()),
                overrides.message.as_deref().unwrap_or(current.message()),
                overrides.http_status_code.unwrap_or(current.http_status_code()),
            );
        }
        Ok(core)
    }

    /// Validate and build the catalog
    ///
    /// # Errors
    ///
    /// Returns an error if an override names an unknown role or the declared
    /// errors violate a catalog invariant
    pub fn build(&self) -> anyhow::Result<ProjectErrorCatalog> {
        let catalog = ProjectErrorCatalog::builder(self.range.clone())
            .core_errors(self.core_errors()?)
            .errors(self.errors.iter().map(ErrorDeclaration::to_api_error))
            .status_code_priority_order(self.status_code_priority_order.clone())
            .build()
            .map_err(|e| anyhow::anyhow!("invalid error catalog: {e}"))?;
        Ok(catalog)
    }

    /// Check statuses and names before the catalog is built
    pub(crate) fn validate(&self) -> anyhow::Result<()> {
        let valid_status = |status: u16| (100..=599).contains(&status);

        for status in &self.status_code_priority_order {
            if !valid_status(*status) {
                anyhow::bail!("catalog.status_code_priority_order contains invalid HTTP status {status}");
            }
        }

        for (name, overrides) in &self.core {
            core_role(name)?;
            if let Some(status) = overrides.http_status_code
                && !valid_status(status)
            {
                anyhow::bail!("catalog.core.{name} has invalid HTTP status {status}");
            }
        }

        for declaration in &self.errors {
            if declaration.name.trim().is_empty() {
                anyhow::bail!("catalog error with code '{}' has an empty name", declaration.code);
            }
            if !valid_status(declaration.http_status_code) {
                anyhow::bail!(
                    "catalog error '{}' has invalid HTTP status {}",
                    declaration.name,
                    declaration.http_status_code
                );
            }
            if let Some((key, _)) = declaration
                .metadata
                .iter()
                .find(|(_, value)| value.is_object() || value.is_array())
            {
                anyhow::bail!(
                    "catalog error '{}' metadata '{key}' must be a scalar or string",
                    declaration.name
                );
            }
        }

        Ok(())
    }
}

fn core_role(name: &str) -> anyhow::Result<CoreRole> {
    CoreRole::from_str(name).map_err(|_| anyhow::anyhow!("catalog.core.{name} is not a core error"))
}

fn default_priority_order() -> Vec<u16> {
    DEFAULT_STATUS_CODE_PRIORITY_ORDER.to_vec()
}
