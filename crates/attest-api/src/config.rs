//! # Service Configuration
//!
//! Settings come from the environment. An optional YAML file named by
//! `ATTEST_CONFIG` overrides the lifecycle rules and the notification
//! addresses:
//!
//! ```yaml
//! rules:
//!   manual_due_days: 14
//!   hr_escalation_after_days: 5
//! notify:
//!   from: compliance@acme.test
//!   hr_recipients: [people@acme.test]
//! ```
//!
//! Missing keys keep their defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use attest_core::AttestError;
use attest_notify::{NotifyConfig, NotifyError};
use attest_state::LifecycleRules;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid lifecycle rules: {0}")]
    Rules(#[from] AttestError),

    #[error("invalid notification settings: {0}")]
    Notify(#[from] NotifyError),

    #[error("invalid value for {var}: {value:?}")]
    Env { var: &'static str, value: String },
}

/// On-disk shape of the YAML file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub rules: LifecycleRules,
    pub notify: NotifyConfig,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Application configuration.
///
/// `Debug` goes through [`NotifyConfig`]'s redacting implementation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    pub rules: LifecycleRules,
    pub notify: NotifyConfig,
    /// Install the Prometheus recorder and serve `/metrics`.
    pub metrics_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            rules: LifecycleRules::default(),
            notify: NotifyConfig::default(),
            metrics_enabled: true,
        }
    }
}

impl AppConfig {
    /// Defaults, then the YAML file (if any), then environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let file = match std::env::var("ATTEST_CONFIG") {
            Ok(path) if !path.trim().is_empty() => {
                tracing::info!(path = %path, "loading configuration file");
                FileConfig::load(Path::new(&path))?
            }
            _ => FileConfig::default(),
        };
        Self::from_file(file)
    }

    /// Layer environment variables over a parsed file.
    pub fn from_file(file: FileConfig) -> Result<Self, ConfigError> {
        file.rules.validate()?;

        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::Env {
                var: "PORT",
                value: raw,
            })?,
            Err(_) => 8080,
        };
        let metrics_enabled = match std::env::var("ATTEST_METRICS_ENABLED") {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::Env {
                var: "ATTEST_METRICS_ENABLED",
                value: raw,
            })?,
            Err(_) => true,
        };

        Ok(Self {
            port,
            rules: file.rules,
            notify: file.notify.with_env()?,
            metrics_enabled,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let file = write_yaml("rules:\n  manual_due_days: 14\nnotify:\n  from: compliance@acme.test\n");
        let cfg = FileConfig::load(file.path()).unwrap();
        assert_eq!(cfg.rules.manual_due_days, 14);
        assert_eq!(cfg.rules.hr_escalation_after_days, 7);
        assert_eq!(cfg.notify.from, "compliance@acme.test");
        assert_eq!(cfg.notify.hr_recipients, vec!["hr@company.com"]);
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let file = write_yaml("");
        let cfg = FileConfig::load(file.path()).unwrap();
        assert_eq!(cfg.rules, LifecycleRules::default());
    }

    #[test]
    fn unknown_section_is_rejected() {
        let file = write_yaml("rulez:\n  manual_due_days: 14\n");
        assert!(matches!(
            FileConfig::load(file.path()),
            Err(ConfigError::Yaml { .. })
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileConfig::load(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn incoherent_rules_fail_validation() {
        let file = write_yaml("rules:\n  hr_escalation_after_days: 20\n  cxo_escalation_after_days: 10\n");
        let parsed = FileConfig::load(file.path()).unwrap();
        assert!(matches!(
            AppConfig::from_file(parsed),
            Err(ConfigError::Rules(_))
        ));
    }

    #[test]
    fn flags_parse_common_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
