use std::sync::OnceLock;

use regex::{Captures, Regex};

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    // `{{ env.NAME }}` or `{{ env.NAME | default("value") }}`
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r#"\{\{\s*([A-Za-z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\)\s*)?\}\}"#)
            .expect("placeholder pattern is valid")
    })
}

/// Value for one placeholder
fn substitute(captures: &Captures<'_>) -> anyhow::Result<String> {
    let key = &captures[1];
    let Some(name) = key.strip_prefix("env.").filter(|name| !name.contains('.')) else {
        anyhow::bail!("unsupported placeholder `{key}`, only `env.NAME` is available");
    };

    match (std::env::var(name), captures.get(2)) {
        (Ok(value), _) => Ok(value),
        (Err(_), Some(default)) => Ok(default.as_str().to_owned()),
        (Err(_), None) => anyhow::bail!("environment variable `{name}` is not set and has no default"),
    }
}

/// Replace `{{ env.NAME }}` placeholders in raw configuration text
///
/// Comment lines are copied verbatim so a commented-out placeholder never
/// requires its variable to be set.
pub fn expand_env(input: &str) -> anyhow::Result<String> {
    let mut output = String::with_capacity(input.len());

    for line in input.split_inclusive('\n') {
        if line.trim_start().starts_with('#') {
            output.push_str(line);
            continue;
        }

        let mut copied_up_to = 0;
        for captures in placeholder().captures_iter(line) {
            let Some(whole) = captures.get(0) else { continue };
            output.push_str(&line[copied_up_to..whole.start()]);
            output.push_str(&substitute(&captures)?);
            copied_up_to = whole.end();
        }
        output.push_str(&line[copied_up_to..]);
    }

    Ok(output)
}
