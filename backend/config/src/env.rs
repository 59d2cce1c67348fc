//! Environment handling for config values.
//!
//! Two passes run at load time:
//! - `${VAR_NAME}` substitution inside string values (uppercase
//!   `[A-Z_][A-Z0-9_]*` names only, `$${VAR}` escapes to a literal `${VAR}`)
//! - well-known variable overrides (`PORT`, `NEONCHAT_BIND`, ...)

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::schema::{LoggingConfig, NeonChatConfig, ServerConfig};

/// Optional leading `$` marks an escaped reference.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references from `env`.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => {
            let result: Result<Vec<_>> = arr
                .iter()
                .enumerate()
                .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
                .collect();
            Ok(Value::Array(result?))
        }
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains('$') {
        return Ok(s.to_string());
    }

    let mut error: Option<MissingEnvVarError> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &regex::Captures| {
        let var_name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{var_name}}}");
        }
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                if error.is_none() {
                    error = Some(MissingEnvVarError {
                        var_name: var_name.to_string(),
                        config_path: path.to_string(),
                    });
                }
                String::new()
            }
        }
    });

    if let Some(err) = error {
        bail!(err);
    }
    Ok(substituted.into_owned())
}

/// Apply well-known environment overrides on top of the file values.
///
/// `PORT` keeps the conventional hosting-platform name; the rest are
/// namespaced.
pub fn apply_env_overrides(
    mut config: NeonChatConfig,
    env: &HashMap<String, String>,
) -> Result<NeonChatConfig> {
    if let Some(port) = env.get("PORT").filter(|v| !v.is_empty()) {
        let port: u16 = port
            .parse()
            .with_context(|| format!("PORT is not a valid port number: {port}"))?;
        config.server.get_or_insert_with(ServerConfig::default).port = Some(port);
    }
    if let Some(bind) = env.get("NEONCHAT_BIND").filter(|v| !v.is_empty()) {
        config.server.get_or_insert_with(ServerConfig::default).bind = Some(bind.clone());
    }
    if let Some(dir) = env.get("NEONCHAT_STATIC_DIR").filter(|v| !v.is_empty()) {
        config.server.get_or_insert_with(ServerConfig::default).static_dir =
            Some(PathBuf::from(dir));
    }
    if let Some(level) = env.get("NEONCHAT_LOG").filter(|v| !v.is_empty()) {
        config.logging.get_or_insert_with(LoggingConfig::default).level = Some(level.clone());
    }
    Ok(config)
}
