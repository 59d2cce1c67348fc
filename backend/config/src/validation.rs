//! Config validation with field paths in every message.

use crate::schema::NeonChatConfig;
use thiserror::Error;

/// Upper bound above which interest lists stop being useful for matching.
const MAX_SENSIBLE_INTERESTS: usize = 64;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &NeonChatConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_server(config, &mut report);
    validate_matching(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_server(config: &NeonChatConfig, report: &mut ValidationReport) {
    let Some(server) = &config.server else { return };
    if let Some(port) = server.port {
        if port == 0 {
            report.error("server.port", "Port must be > 0");
        } else if port < 1024 && port != 80 && port != 443 {
            report.warn(
                "server.port",
                format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
            );
        }
    }
    if let Some(bind) = &server.bind {
        if bind.parse::<std::net::IpAddr>().is_err() {
            report.error("server.bind", format!("'{bind}' is not an IP address"));
        }
    }
    if let Some(dir) = &server.static_dir {
        if !dir.is_dir() {
            report.warn(
                "server.static_dir",
                format!("{} is not a directory; static hosting will return 404", dir.display()),
            );
        }
    }
}

fn validate_matching(config: &NeonChatConfig, report: &mut ValidationReport) {
    let Some(matching) = &config.matching else { return };
    match matching.max_interests {
        Some(0) => report.error("matching.max_interests", "max_interests must be >= 1"),
        Some(n) if n > MAX_SENSIBLE_INTERESTS => report.warn(
            "matching.max_interests",
            format!("{n} interests per client makes every pass slower"),
        ),
        _ => {}
    }
    if matching.max_tag_length == Some(0) {
        report.error("matching.max_tag_length", "max_tag_length must be >= 1");
    }
    if matching.max_message_length == Some(0) {
        report.error("matching.max_message_length", "max_message_length must be >= 1");
    }
}

fn validate_logging(config: &NeonChatConfig, report: &mut ValidationReport) {
    let Some(logging) = &config.logging else { return };
    if let Some(level) = &logging.level {
        let simple = matches!(
            level.to_ascii_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error" | "off"
        );
        if !simple && !level.contains('=') {
            report.warn(
                "logging.level",
                format!("Unrecognised level '{level}'; falling back to tracing's parser"),
            );
        }
    }
}
