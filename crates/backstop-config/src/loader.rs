use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if environment variable expansion fails, TOML
    /// parsing fails, or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        tracing::debug!(
            project_errors = config.catalog.errors.len(),
            core_overrides = config.catalog.core.len(),
            "configuration loaded"
        );

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if a header name, HTTP status or core role is
    /// invalid, or the telemetry export interval is zero
    pub fn validate(&self) -> anyhow::Result<()> {
        self.handler.error_id_header()?;
        self.catalog.validate()?;
        self.validate_telemetry()?;
        Ok(())
    }

    fn validate_telemetry(&self) -> anyhow::Result<()> {
        if let Some(metrics) = self.telemetry.as_ref().and_then(|telemetry| telemetry.metrics.as_ref())
            && metrics.exporter.export_interval_secs == 0
        {
            anyhow::bail!("telemetry.metrics.exporter.export_interval_secs must be greater than zero");
        }

        Ok(())
    }
}
