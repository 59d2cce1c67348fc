pub mod error;
pub mod event;
pub mod limits;
pub mod traits;
pub mod types;

pub use error::NeonChatError;
pub use event::{ClientEvent, ServerEvent};
pub use traits::Outbound;
pub use types::{ConnectionId, SignalKind, SignalPayload};
