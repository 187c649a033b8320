//! YAML parser with helpful error messages

use std::path::Path;

use anyhow::{Context, Result};

use super::schema::OvertureConfig;

/// Parse an overture config file with detailed error messages
pub fn parse_config(path: &Path) -> Result<OvertureConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse overture config content from string
pub fn parse_config_str(content: &str) -> Result<OvertureConfig> {
    // An empty file is a valid, empty config
    if content.trim().is_empty() {
        return Ok(OvertureConfig::new());
    }

    let mut config: OvertureConfig =
        serde_yaml::from_str(content).map_err(|e| enhance_yaml_error(e, content))?;
    config.assign_names();
    config.validate()?;

    Ok(config)
}

/// Serialize a configuration to a YAML string
pub fn to_yaml(config: &OvertureConfig) -> Result<String> {
    serde_yaml::to_string(config).context("Failed to serialize config to YAML")
}

fn enhance_yaml_error(error: serde_yaml::Error, content: &str) -> anyhow::Error {
    match error.location() {
        Some(location) => {
            let context = get_line_context(content, location.line());
            anyhow::anyhow!(
                "YAML parsing error at line {}, column {}:\n{}\n\nError: {}",
                location.line(),
                location.column(),
                context,
                error
            )
        }
        None => anyhow::anyhow!("YAML parsing error: {}", error),
    }
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 2).min(lines.len());
    if start >= end {
        return String::new();
    }

    lines[start..end]
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let num = start + i + 1;
            let marker = if num == line_num { ">>>" } else { "   " };
            format!("{} {:4} | {}", marker, num, line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
