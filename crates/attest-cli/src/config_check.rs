//! # Config-Check Subcommand
//!
//! Loads a YAML configuration the way the service does and reports the
//! effective lifecycle rules, so a bad file fails in CI instead of at boot.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct ConfigCheckArgs {
    /// Path to the YAML configuration file.
    #[arg(value_name = "CONFIG_YAML")]
    pub path: PathBuf,
}

pub fn run_config_check(args: &ConfigCheckArgs) -> Result<u8> {
    let rules = crate::load_rules(Some(&args.path))?;
    tracing::info!(path = %args.path.display(), "configuration is valid");
    println!("{}", serde_json::to_string_pretty(&rules)?);
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn yaml(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn valid_file_passes() {
        let f = yaml("rules:\n  manual_due_days: 10\n");
        let code = run_config_check(&ConfigCheckArgs {
            path: f.path().to_path_buf(),
        })
        .unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn inverted_thresholds_fail() {
        let f = yaml("rules:\n  hr_escalation_after_days: 30\n");
        assert!(run_config_check(&ConfigCheckArgs {
            path: f.path().to_path_buf(),
        })
        .is_err());
    }
}
