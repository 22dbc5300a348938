use std::sync::OnceLock;

use http::header::{self, HeaderMap, HeaderName};
use regex::Regex;
use serde::Deserialize;

const REDACTED: &str = "[REDACTED]";

/// Either a specific header name or a regex pattern over header names
#[derive(Debug, Clone)]
pub enum NameOrPattern {
    /// Exact header name
    Name(HeaderName),
    /// Regex matched against lowercase header names
    Pattern(HeaderPattern),
}

impl NameOrPattern {
    fn matches(&self, name: &HeaderName) -> bool {
        match self {
            Self::Name(expected) => expected == name,
            Self::Pattern(pattern) => pattern.0.is_match(name.as_str()),
        }
    }
}

/// Compiled regex pattern for matching header names
#[derive(Debug, Clone)]
pub struct HeaderPattern(pub Regex);

/// Headers whose values never reach the logs
static ALWAYS_REDACTED: OnceLock<[HeaderName; 5]> = OnceLock::new();

fn always_redacted() -> &'static [HeaderName] {
    ALWAYS_REDACTED.get_or_init(|| {
        [
            header::AUTHORIZATION,
            header::PROXY_AUTHORIZATION,
            header::COOKIE,
            header::SET_COOKIE,
            HeaderName::from_static("x-api-key"),
        ]
    })
}

/// Decides which request header values are masked in error logs
#[derive(Debug, Clone, Default)]
pub struct HeaderRedaction {
    rules: Vec<NameOrPattern>,
}

impl HeaderRedaction {
    /// Redact the built-in sensitive headers plus anything matching `rules`
    pub const fn new(rules: Vec<NameOrPattern>) -> Self {
        Self { rules }
    }

    /// Whether the value of `name` must be masked
    pub fn is_redacted(&self, name: &HeaderName) -> bool {
        always_redacted().contains(name) || self.rules.iter().any(|rule| rule.matches(name))
    }

    /// Render headers as `name=value` pairs for a log line
    ///
    /// Repeated headers are joined with commas; values that are not visible
    /// ASCII are replaced with `<binary>`.
    pub fn render(&self, headers: &HeaderMap) -> String {
        headers
            .keys()
            .map(|name| {
                let value = if self.is_redacted(name) {
                    REDACTED.to_owned()
                } else {
                    headers
                        .get_all(name)
                        .iter()
                        .map(|value| value.to_str().unwrap_or("<binary>"))
                        .collect::<Vec<_>>()
                        .join(",")
                };
                format!("{name}={value}")
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl<'de> Deserialize<'de> for NameOrPattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        // Regex metacharacters mark a pattern; anything else must be a valid header name
        if s.contains(['*', '?', '[', '(', '^', '$', '|']) {
            let regex = Regex::new(&s).map_err(|e| serde::de::Error::custom(format!("invalid pattern: {e}")))?;
            Ok(Self::Pattern(HeaderPattern(regex)))
        } else {
            let name = HeaderName::try_from(s.as_str()).map_err(serde::de::Error::custom)?;
            Ok(Self::Name(name))
        }
    }
}
