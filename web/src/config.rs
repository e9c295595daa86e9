//! Server configuration.
//!
//! Loaded from environment variables with defaults for everything, optionally
//! backed by a `.env` file. A variable that is set but cannot be parsed keeps
//! the default and is recorded in [`ServerConfig::ignored`] so the caller can
//! warn about it once logging is up.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::Path;

/// Bind address, log level and dispatch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to (`PARAMBIND_HOST`)
    pub host: String,
    /// Port to bind to (`PARAMBIND_PORT`)
    pub port: u16,
    /// Default log filter when `RUST_LOG` is unset (`PARAMBIND_LOG_LEVEL`)
    pub log_level: String,
    /// Retry unmatched paths with the trailing slash toggled (`PARAMBIND_REDIRECT_SLASHES`)
    pub redirect_slashes: bool,
    /// Variables that were set but unparsable, as `NAME=value`
    #[serde(skip)]
    pub ignored: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            log_level: "info".to_string(),
            redirect_slashes: true,
            ignored: Vec::new(),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl ServerConfig {
    /// Load from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from the process environment, falling back to the variables in
    /// the dotenv file at `path`. The process environment wins.
    ///
    /// # Errors
    ///
    /// Returns the [`dotenvy::Error`] for a missing or malformed file; use
    /// [`dotenvy::Error::not_found`] to tell the two apart.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, dotenvy::Error> {
        let file: HashMap<String, String> = dotenvy::from_path_iter(path)?.collect::<Result<_, _>>()?;
        Ok(Self::from_lookup(|name| {
            env::var(name).ok().or_else(|| file.get(name).cloned())
        }))
    }

    /// Load using `lookup` to read variables.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(host) = lookup("PARAMBIND_HOST") {
            if host.trim().is_empty() {
                config.ignored.push(format!("PARAMBIND_HOST={host}"));
            } else {
                config.host = host.trim().to_string();
            }
        }

        if let Some(port) = lookup("PARAMBIND_PORT") {
            match port.trim().parse() {
                Ok(port) => config.port = port,
                Err(_) => config.ignored.push(format!("PARAMBIND_PORT={port}")),
            }
        }

        if let Some(level) = lookup("PARAMBIND_LOG_LEVEL") {
            let normalized = level.trim().to_ascii_lowercase();
            if LOG_LEVELS.contains(&normalized.as_str()) {
                config.log_level = normalized;
            } else {
                config.ignored.push(format!("PARAMBIND_LOG_LEVEL={level}"));
            }
        }

        if let Some(flag) = lookup("PARAMBIND_REDIRECT_SLASHES") {
            match parambind_core::coerce::parse_bool_token(&flag) {
                Some(enabled) => config.redirect_slashes = enabled,
                None => config.ignored.push(format!("PARAMBIND_REDIRECT_SLASHES={flag}")),
            }
        }

        config
    }

    /// `host:port` for binding a listener.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn load(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]);
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.addr(), "127.0.0.1:8000");
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("PARAMBIND_HOST", "0.0.0.0"),
            ("PARAMBIND_PORT", "9000"),
            ("PARAMBIND_LOG_LEVEL", "DEBUG"),
            ("PARAMBIND_REDIRECT_SLASHES", "off"),
        ]);
        assert_eq!(config.addr(), "0.0.0.0:9000");
        assert_eq!(config.log_level, "debug");
        assert!(!config.redirect_slashes);
        assert!(config.ignored.is_empty());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = load(&[
            ("PARAMBIND_PORT", "eighty"),
            ("PARAMBIND_LOG_LEVEL", "loud"),
            ("PARAMBIND_REDIRECT_SLASHES", "maybe"),
        ]);
        assert_eq!(config.port, 8000);
        assert_eq!(config.log_level, "info");
        assert!(config.redirect_slashes);
        assert_eq!(
            config.ignored,
            [
                "PARAMBIND_PORT=eighty",
                "PARAMBIND_LOG_LEVEL=loud",
                "PARAMBIND_REDIRECT_SLASHES=maybe"
            ]
        );
    }

    #[test]
    fn test_env_file_supplies_unset_variables() {
        let path = env::temp_dir().join(format!("parambind-{}.env", uuid::Uuid::new_v4()));
        std::fs::write(&path, "PARAMBIND_PORT=9100\nPARAMBIND_REDIRECT_SLASHES=false\n").unwrap();
        let config = ServerConfig::from_env_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.port, 9100);
        assert!(!config.redirect_slashes);
    }

    #[test]
    fn test_missing_env_file_is_reported() {
        let path = env::temp_dir().join(format!("parambind-{}.env", uuid::Uuid::new_v4()));
        let err = ServerConfig::from_env_file(&path).unwrap_err();
        assert!(err.not_found());
    }
}
