//! NeonChat Gateway
//!
//! HTTP + WebSocket transport in front of the matchmaker: one actor per
//! socket, JSON event frames, health reporting, and client hosting.

pub mod client_ui;
pub mod health_api;
pub mod server;
pub mod session_registry;
pub mod ws_protocol;
pub mod ws_server;

pub use server::{build_router, start_server, GatewayState};
pub use session_registry::ClientRegistry;
