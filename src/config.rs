//! Configuration loading and defaults.
//!
//! Configuration is resolved in order of precedence (highest wins):
//!
//! 1. **Environment variables** — `PMON_HOST`, `PMON_PORT`, `PMON_USER`,
//!    `PMON_PASSWORD`, `PMON_TIMEOUT_MS`
//! 2. **Config file** — path via `--config <path>`, or `pmon.toml` in CWD
//! 3. **Compiled defaults** — see each field's default value below
//!
//! The TOML file mirrors the struct hierarchy:
//!
//! ```toml
//! [pmon]
//! host = "localhost"
//! port = 4999
//! user = ""           # empty credentials send the anonymous "##" prefix
//! password = ""
//! timeout_ms = 5000
//!
//! [logging]
//! level = "info"
//! ```

use serde::Deserialize;
use std::path::Path;

/// Top-level configuration, deserialized from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pmon: PmonConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection settings for the Pmon daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct PmonConfig {
    /// Daemon host (default `localhost`). Override with `PMON_HOST`.
    #[serde(default = "default_host")]
    pub host: String,
    /// Daemon TCP port (default 4999). Override with `PMON_PORT`.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Protocol user name; empty means anonymous. Override with `PMON_USER`.
    #[serde(default)]
    pub user: String,
    /// Protocol password; empty means anonymous. Override with
    /// `PMON_PASSWORD`.
    #[serde(default)]
    pub password: String,
    /// Per-command reply window in milliseconds (default 5000). Override
    /// with `PMON_TIMEOUT_MS`.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// tracing filter level (default `info`). Overridden by `RUST_LOG`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_host() -> String {
    "localhost".to_string()
}
fn default_port() -> u16 {
    4999
}
fn default_timeout_ms() -> u64 {
    5000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PmonConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            user: String::new(),
            password: String::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration with the precedence chain: env vars > file >
    /// defaults.
    pub fn load(path: Option<&str>) -> Result<Config, String> {
        let mut config = Config::from_file(path)?;
        config.apply_env()?;
        Ok(config)
    }

    /// Resolve the file layer on its own, before any environment
    /// overrides.
    ///
    /// An explicit `path` that cannot be read or parsed is an error.
    /// Without a path, `pmon.toml` in the current directory is used when
    /// present, otherwise compiled defaults.
    fn from_file(path: Option<&str>) -> Result<Config, String> {
        if let Some(p) = path {
            let content = std::fs::read_to_string(p)
                .map_err(|e| format!("Failed to read config file {p}: {e}"))?;
            toml::from_str(&content).map_err(|e| format!("Failed to parse config file {p}: {e}"))
        } else if Path::new("pmon.toml").exists() {
            let content = std::fs::read_to_string("pmon.toml")
                .map_err(|e| format!("Failed to read pmon.toml: {e}"))?;
            toml::from_str(&content).map_err(|e| format!("Failed to parse pmon.toml: {e}"))
        } else {
            Ok(Config::default())
        }
    }

    /// Apply `PMON_*` environment overrides. Numeric values that fail to
    /// parse are configuration errors, not silent defaults.
    fn apply_env(&mut self) -> Result<(), String> {
        if let Ok(host) = std::env::var("PMON_HOST") {
            self.pmon.host = host;
        }
        if let Ok(port) = std::env::var("PMON_PORT") {
            self.pmon.port = port
                .parse()
                .map_err(|_| format!("Invalid PMON_PORT value: {port}"))?;
        }
        if let Ok(user) = std::env::var("PMON_USER") {
            self.pmon.user = user;
        }
        if let Ok(password) = std::env::var("PMON_PASSWORD") {
            self.pmon.password = password;
        }
        if let Ok(timeout) = std::env::var("PMON_TIMEOUT_MS") {
            self.pmon.timeout_ms = timeout
                .parse()
                .map_err(|_| format!("Invalid PMON_TIMEOUT_MS value: {timeout}"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn compiled_defaults() {
        let config = Config::default();
        assert_eq!(config.pmon.host, "localhost");
        assert_eq!(config.pmon.port, 4999);
        assert_eq!(config.pmon.user, "");
        assert_eq!(config.pmon.password, "");
        assert_eq!(config.pmon.timeout_ms, 5000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_file_keeps_defaults_for_the_rest() {
        let config: Config = toml::from_str("[pmon]\nhost = \"scada-main\"\nport = 5999\n").unwrap();
        assert_eq!(config.pmon.host, "scada-main");
        assert_eq!(config.pmon.port, 5999);
        assert_eq!(config.pmon.timeout_ms, 5000);
        assert_eq!(config.logging.level, "info");
    }

    // The file tests go through `from_file` rather than `load`, so
    // `PMON_*` variables in the invoking shell cannot leak into them.

    #[test]
    fn loads_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pmon]").unwrap();
        writeln!(file, "user = \"admin\"").unwrap();
        writeln!(file, "password = \"secret\"").unwrap();
        writeln!(file, "[logging]").unwrap();
        writeln!(file, "level = \"debug\"").unwrap();

        let config = Config::from_file(file.path().to_str()).unwrap();
        assert_eq!(config.pmon.user, "admin");
        assert_eq!(config.pmon.password, "secret");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = Config::from_file(Some("/does/not/exist/pmon.toml")).unwrap_err();
        assert!(err.contains("Failed to read config file"));
    }

    #[test]
    fn garbage_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not toml [").unwrap();

        let err = Config::from_file(file.path().to_str()).unwrap_err();
        assert!(err.contains("Failed to parse config file"));
    }
}
