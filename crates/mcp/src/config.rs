//! Server configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Default executable name, resolved through `PATH`.
pub const DEFAULT_BINARY: &str = "aid";

/// aid-mcp server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server name for MCP identification
    pub server_name: String,
    /// Server version
    pub version: String,
    /// The `aid` executable
    pub binary: PathBuf,
    /// Directory `aid` runs in; relative targets resolve against it
    pub working_dir: Option<PathBuf>,
    /// Deadline for each `aid` invocation
    pub job_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_name: "AI Distiller MCP".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            binary: DEFAULT_BINARY.into(),
            working_dir: None,
            job_timeout: None,
        }
    }
}

impl ServerConfig {
    /// Defaults overlaid with `AID_BINARY`, `AID_ROOT` and `AID_MCP_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(binary) = non_empty(lookup("AID_BINARY")) {
            config.binary = binary.into();
        }

        if let Some(root) = non_empty(lookup("AID_ROOT")) {
            config.working_dir = Some(root.into());
        }

        if let Some(raw) = non_empty(lookup("AID_MCP_TIMEOUT_SECS")) {
            match raw.trim().parse::<u64>() {
                Ok(0) => config.job_timeout = None,
                Ok(secs) => config.job_timeout = Some(Duration::from_secs(secs)),
                Err(_) => tracing::warn!(value = %raw, "Ignoring invalid AID_MCP_TIMEOUT_SECS"),
            }
        }

        config
    }

    /// Whether debug logging was requested through the environment.
    pub fn debug_requested<F>(lookup: F) -> bool
    where
        F: Fn(&str) -> Option<String>,
    {
        ["AID_MCP_DEBUG", "DEBUG"]
            .iter()
            .filter_map(|key| lookup(key))
            .any(|value| is_truthy(&value))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.server_name, "AI Distiller MCP");
        assert_eq!(config.binary, PathBuf::from("aid"));
        assert!(config.working_dir.is_none());
        assert!(config.job_timeout.is_none());
        assert!(!config.version.is_empty());
    }

    #[test]
    fn test_config_from_lookup() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("AID_BINARY", "/opt/aid/bin/aid"),
            ("AID_ROOT", "/work/project"),
            ("AID_MCP_TIMEOUT_SECS", "90"),
        ]));

        assert_eq!(config.binary, PathBuf::from("/opt/aid/bin/aid"));
        assert_eq!(config.working_dir, Some(PathBuf::from("/work/project")));
        assert_eq!(config.job_timeout, Some(Duration::from_secs(90)));
    }

    #[test]
    fn test_config_ignores_blank_and_invalid_values() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("AID_BINARY", "  "),
            ("AID_MCP_TIMEOUT_SECS", "soon"),
        ]));
        assert_eq!(config.binary, PathBuf::from("aid"));
        assert!(config.job_timeout.is_none());

        let zero = ServerConfig::from_lookup(lookup(&[("AID_MCP_TIMEOUT_SECS", "0")]));
        assert!(zero.job_timeout.is_none());
    }

    #[test]
    fn test_debug_requested() {
        assert!(ServerConfig::debug_requested(lookup(&[("DEBUG", "true")])));
        assert!(ServerConfig::debug_requested(lookup(&[("AID_MCP_DEBUG", "1")])));
        assert!(!ServerConfig::debug_requested(lookup(&[("DEBUG", "0")])));
        assert!(!ServerConfig::debug_requested(lookup(&[])));
    }
}
