use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Endpoint the feed query is POSTed to
    pub post_url: String,

    /// Page scraped for the access token; no scraping when absent
    #[serde(default)]
    pub token_url: Option<String>,

    /// Extra request headers sent with the feed query
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Request body for the feed query
    pub payload: serde_json::Value,

    /// Where the merged event store lives
    #[serde(default = "default_store_path")]
    pub store_path: String,

    /// Where the generated calendar is written
    #[serde(default = "default_calendar_path")]
    pub calendar_path: String,
}

fn default_store_path() -> String {
    "events.json".to_string()
}

fn default_calendar_path() -> String {
    "events.ics".to_string()
}

impl Config {
    /// Store path with ~ expanded.
    pub fn store_file(&self) -> PathBuf {
        expand_path(&self.store_path)
    }

    /// Calendar path with ~ expanded.
    pub fn calendar_file(&self) -> PathBuf {
        expand_path(&self.calendar_path)
    }
}

/// Get the config file path (~/.config/dropcal/config.toml)
pub fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("dropcal");
    Ok(config_dir.join("config.toml"))
}

/// Load config from ~/.config/dropcal/config.toml
pub fn load_config() -> Result<Config> {
    let path = config_path()?;

    if !path.exists() {
        anyhow::bail!(
            "Config file not found at {}\n\n\
            Create it with the feed endpoint and query:\n\n\
            post_url = \"https://example.com/graphql\"\n\
            token_url = \"https://example.com/drops/\"\n\n\
            [headers]\n\
            content-type = \"application/json\"\n\n\
            [payload]\n\
            operationName = \"GetPosts\"\n\
            query = \"...\"",
            path.display()
        );
    }

    load_config_from(&path)
}

/// Load config from an explicit path
pub fn load_config_from(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;

    Ok(config)
}

/// Expand ~ in paths to the home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_table_becomes_json() {
        let config: Config = toml::from_str(
            r#"
            post_url = "https://example.com/graphql"

            [headers]
            content-type = "application/json"

            [payload]
            operationName = "GetPosts"

            [payload.variables]
            limit = 100
            "#,
        )
        .unwrap();

        assert_eq!(config.payload["operationName"], "GetPosts");
        assert_eq!(config.payload["variables"]["limit"], 100);
        assert_eq!(
            config.headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn test_paths_default() {
        let config: Config = toml::from_str(
            r#"
            post_url = "https://example.com/graphql"
            payload = {}
            "#,
        )
        .unwrap();

        assert_eq!(config.store_path, "events.json");
        assert_eq!(config.calendar_path, "events.ics");
        assert_eq!(config.token_url, None);
    }
}
