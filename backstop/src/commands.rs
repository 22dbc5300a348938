use backstop_classify::ApiException;
use backstop_config::Config;
use backstop_core::RequestInfo;

/// Summary of a valid catalog
pub fn check(config: &Config) -> anyhow::Result<String> {
    let catalog = config.build_catalog()?;
    let order = catalog
        .status_code_priority_order()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!(
        "catalog ok: {} errors ({} core, {} project), range {}, status priority [{order}]",
        catalog.errors().len(),
        catalog.core_errors().len(),
        catalog.project_errors().len(),
        catalog.range(),
    ))
}

/// Every catalog error as a JSON array
pub fn catalog(config: &Config) -> anyhow::Result<String> {
    let catalog = config.build_catalog()?;
    Ok(serde_json::to_string_pretty(catalog.errors())?)
}

/// Status line and contract body for a response carrying `names`
pub fn render(config: &Config, names: &[String]) -> anyhow::Result<String> {
    let resolver = config.resolver()?;

    let errors = names
        .iter()
        .map(|name| {
            resolver
                .catalog()
                .convert_to_api_error(name)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no error named '{name}' in the catalog"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let exception = ApiException::builder()
        .errors(errors)
        .log_detail("rendered_by", "backstop render")
        .build();
    let response = resolver.resolve(&exception, &RequestInfo::empty());

    Ok(format!(
        "HTTP {}\n{}",
        response.status(),
        serde_json::to_string_pretty(&response.contract)?
    ))
}
