//! `neonchat-config`: NeonChat server configuration.
//!
//! Provides:
//! - Typed config schema (server, matching limits, logging)
//! - YAML read/write
//! - `${ENV_VAR}` substitution and well-known env overrides
//! - Default value application
//! - Validation with path-qualified messages

pub mod defaults;
pub mod env;
pub mod io;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{apply_env_overrides, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_config, resolve_config_path, write_config};
pub use schema::{LoggingConfig, MatchingConfig, NeonChatConfig, ServerConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// Load, substitute env vars, apply overrides and defaults, and validate.
///
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(path: &Path) -> Result<NeonChatConfig> {
    let raw_config = load_config(path).await?;
    prepare(raw_config, &std::env::vars().collect())
}

/// The post-read half of [`load_and_prepare`], with an explicit env map.
pub fn prepare(raw_config: NeonChatConfig, env: &HashMap<String, String>) -> Result<NeonChatConfig> {
    let value: Value =
        serde_json::to_value(&raw_config).context("Failed to serialize config for processing")?;

    let value = resolve_env_vars_with(&value, env).context("Failed to resolve env vars in config")?;

    let config: NeonChatConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_env_overrides(config, env)?;
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
    if let Some(first) = report.errors.into_iter().next() {
        bail!(first);
    }

    Ok(config)
}
