//! # attest-cli: Operator CLI
//!
//! Provides the `attest` command-line interface.
//!
//! ## Subcommands
//!
//! - `attest due-date`: compute a due date and new-joiner window offline.
//! - `attest config-check`: validate a YAML configuration file.
//! - `attest sweep`: trigger an escalation sweep on a running service.
//! - `attest openapi`: print the OpenAPI document.
//!
//! ```bash
//! attest due-date --type new_joiner --join-date 2024-01-01T00:00:00Z
//! attest config-check deploy/attest.yaml
//! attest sweep --url http://localhost:8080
//! ```

pub mod config_check;
pub mod due_date;
pub mod openapi;
pub mod sweep;

use std::path::Path;

use anyhow::{Context, Result};
use attest_api::config::FileConfig;
use attest_state::LifecycleRules;

/// Lifecycle rules from an optional YAML file, defaults otherwise.
pub fn load_rules(path: Option<&Path>) -> Result<LifecycleRules> {
    let rules = match path {
        Some(path) => {
            FileConfig::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?
                .rules
        }
        None => LifecycleRules::default(),
    };
    rules.validate().context("invalid lifecycle rules")?;
    Ok(rules)
}
