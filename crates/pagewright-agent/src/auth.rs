//! API key lookup for the generation service

use pagewright_core::{PagewrightError, Result};
use std::env;

/// Read the API key from the configured environment variable
///
/// Blank values are treated as missing.
pub fn get_api_key(env_var: &str) -> Result<String> {
    match env::var(env_var) {
        Ok(key) if !key.trim().is_empty() => {
            tracing::debug!("Using API key from {}", env_var);
            Ok(key.trim().to_string())
        }
        _ => Err(PagewrightError::Auth(format!(
            "No API key found. Set {}=<key> or change generation.api_key_env in .pagewright/config.toml",
            env_var
        ))),
    }
}
