use anyhow::Result;
use serde::Serialize;

/// How command results are rendered on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formatter {
    Json,
    Yaml,
    Human,
}

impl Formatter {
    /// Structured rendering; `None` for `Human`, which has per-type formatters.
    pub fn structured<T: Serialize>(&self, data: &T) -> Result<Option<String>> {
        match self {
            Formatter::Json => Ok(Some(serde_json::to_string_pretty(data)?)),
            Formatter::Yaml => Ok(Some(serde_yaml::to_string(data)?)),
            Formatter::Human => Ok(None),
        }
    }
}

pub fn get_formatter(format: &str) -> Formatter {
    match format {
        "json" => Formatter::Json,
        "yaml" => Formatter::Yaml,
        _ => Formatter::Human,
    }
}
