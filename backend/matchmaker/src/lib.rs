//! NeonChat matchmaker.
//!
//! Pairs anonymous connections into one-on-one sessions and relays chat,
//! typing, and WebRTC signaling between partners. All state lives in one
//! [`SessionState`] behind the [`Matchmaker`]'s mutex, so every inbound
//! event is applied as a single serialized step.

pub mod lifecycle;
pub mod limits;
pub mod matcher;
pub mod pool;
pub mod presence;
pub mod registry;
pub mod relay;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use lifecycle::Matchmaker;
pub use limits::MatchingLimits;
pub use matcher::Match;
pub use pool::WaitingPool;
pub use registry::{Connection, ConnectionRegistry};
pub use state::{ConnectionState, SessionState};
