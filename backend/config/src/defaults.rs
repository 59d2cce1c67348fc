//! Config defaults: applies the built-in values to a parsed config.

use neonchat_core::limits;

use crate::schema::{LoggingConfig, MatchingConfig, NeonChatConfig, ServerConfig};

pub const DEFAULT_BIND: &str = "0.0.0.0";

pub const DEFAULT_PORT: u16 = 3001;

pub const DEFAULT_MAX_INTERESTS: usize = limits::MAX_INTERESTS;

pub const DEFAULT_MAX_TAG_LENGTH: usize = limits::MAX_TAG_LENGTH;

pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = limits::MAX_MESSAGE_LENGTH;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: NeonChatConfig) -> NeonChatConfig {
    let config = apply_server_defaults(config);
    let config = apply_matching_defaults(config);
    apply_logging_defaults(config)
}

fn apply_server_defaults(mut config: NeonChatConfig) -> NeonChatConfig {
    let server = config.server.get_or_insert_with(ServerConfig::default);
    if server.bind.is_none() {
        server.bind = Some(DEFAULT_BIND.to_string());
    }
    if server.port.is_none() {
        server.port = Some(DEFAULT_PORT);
    }
    config
}

fn apply_matching_defaults(mut config: NeonChatConfig) -> NeonChatConfig {
    let matching = config.matching.get_or_insert_with(MatchingConfig::default);
    matching.max_interests.get_or_insert(DEFAULT_MAX_INTERESTS);
    matching.max_tag_length.get_or_insert(DEFAULT_MAX_TAG_LENGTH);
    matching
        .max_message_length
        .get_or_insert(DEFAULT_MAX_MESSAGE_LENGTH);
    matching.strict_signaling.get_or_insert(false);
    config
}

fn apply_logging_defaults(mut config: NeonChatConfig) -> NeonChatConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    logging.json.get_or_insert(false);
    config
}
