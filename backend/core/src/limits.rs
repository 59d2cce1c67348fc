//! Built-in input limits, shared by the config defaults and the matchmaker.

/// Most interest tags a single join may carry.
pub const MAX_INTERESTS: usize = 10;

/// Longest interest tag, in characters, after trimming.
pub const MAX_TAG_LENGTH: usize = 32;

/// Longest chat message, in characters.
pub const MAX_MESSAGE_LENGTH: usize = 2000;
