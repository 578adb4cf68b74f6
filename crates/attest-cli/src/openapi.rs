//! # OpenAPI Subcommand
//!
//! Prints the service's OpenAPI document without starting it.

use std::path::PathBuf;

use anyhow::{Context, Result};
use attest_api::openapi::ApiDoc;
use clap::Args;
use utoipa::OpenApi;

#[derive(Args, Debug)]
pub struct OpenApiArgs {
    /// Write to this file instead of stdout.
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

pub fn run_openapi(args: &OpenApiArgs) -> Result<u8> {
    let doc = ApiDoc::openapi()
        .to_pretty_json()
        .context("failed to serialize OpenAPI document")?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, doc)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "OpenAPI document written");
        }
        None => println!("{doc}"),
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_document_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("openapi.json");
        run_openapi(&OpenApiArgs {
            out: Some(out.clone()),
        })
        .unwrap();
        let doc: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(out).unwrap()).unwrap();
        assert_eq!(doc["info"]["title"], "Attest API");
        assert!(doc["paths"]["/v1/policies"].is_object());
    }
}
