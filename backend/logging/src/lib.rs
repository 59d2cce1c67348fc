//! Structured logging for NeonChat.
//!
//! Console output, optional rolling NDJSON files, and the session event log.

pub mod event_logger;
pub mod logger;

pub use event_logger::{SessionEvent, SessionEventLogger};
pub use logger::{init_logger, LoggerOptions};
