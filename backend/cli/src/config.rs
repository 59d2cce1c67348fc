use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};

use neonchat_config::{defaults, NeonChatConfig};
use neonchat_logging::LoggerOptions;
use neonchat_matchmaker::MatchingLimits;

/// Everything `serve` needs, resolved from a prepared config.
#[derive(Debug, Clone)]
pub struct ServeSettings {
    pub addr: SocketAddr,
    pub static_dir: Option<PathBuf>,
    pub limits: MatchingLimits,
    pub logger: LoggerOptions,
}

impl ServeSettings {
    /// `port_override` comes from `--port` and beats both the file and `PORT`.
    pub fn from_config(config: &NeonChatConfig, port_override: Option<u16>) -> Result<Self> {
        let server = config.server();
        let matching = config.matching();
        let logging = config.logging();

        let bind = server.bind.as_deref().unwrap_or(defaults::DEFAULT_BIND);
        let ip: IpAddr = bind
            .parse()
            .with_context(|| format!("Invalid bind address: {bind}"))?;
        let port = port_override
            .or(server.port)
            .unwrap_or(defaults::DEFAULT_PORT);

        let fallback = MatchingLimits::default();
        let limits = MatchingLimits {
            max_interests: matching.max_interests.unwrap_or(fallback.max_interests),
            max_tag_length: matching.max_tag_length.unwrap_or(fallback.max_tag_length),
            max_message_length: matching
                .max_message_length
                .unwrap_or(fallback.max_message_length),
            strict_signaling: matching.strict_signaling.unwrap_or(fallback.strict_signaling),
        };

        let logger = LoggerOptions {
            level: logging
                .level
                .unwrap_or_else(|| defaults::DEFAULT_LOG_LEVEL.to_string()),
            json: logging.json.unwrap_or(false),
            dir: logging.dir,
        };

        Ok(Self {
            addr: SocketAddr::new(ip, port),
            static_dir: server.static_dir,
            limits,
            logger,
        })
    }
}
