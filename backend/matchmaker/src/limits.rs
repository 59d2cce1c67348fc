//! Input limits applied before any state is touched.

use std::collections::HashSet;

use neonchat_core::{limits, NeonChatError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchingLimits {
    pub max_interests: usize,
    pub max_tag_length: usize,
    pub max_message_length: usize,
    /// Drop signals whose target is not the sender's partner.
    pub strict_signaling: bool,
}

impl Default for MatchingLimits {
    fn default() -> Self {
        Self {
            max_interests: limits::MAX_INTERESTS,
            max_tag_length: limits::MAX_TAG_LENGTH,
            max_message_length: limits::MAX_MESSAGE_LENGTH,
            strict_signaling: false,
        }
    }
}

impl MatchingLimits {
    /// Trim, lowercase, and dedupe an interest list (first occurrence wins).
    ///
    /// Fails without partial output if any tag is empty or too long, or if
    /// the list has too many entries.
    pub fn normalize_interests(&self, raw: Vec<String>) -> Result<Vec<String>, NeonChatError> {
        if raw.len() > self.max_interests {
            return Err(NeonChatError::invalid(format!(
                "too many interests ({} > {})",
                raw.len(),
                self.max_interests
            )));
        }

        let mut seen = HashSet::new();
        let mut tags = Vec::with_capacity(raw.len());
        for tag in raw {
            let tag = tag.trim().to_lowercase();
            if tag.is_empty() {
                return Err(NeonChatError::invalid("empty interest tag"));
            }
            let len = tag.chars().count();
            if len > self.max_tag_length {
                return Err(NeonChatError::invalid(format!(
                    "interest tag too long ({len} > {})",
                    self.max_tag_length
                )));
            }
            if seen.insert(tag.clone()) {
                tags.push(tag);
            }
        }
        Ok(tags)
    }

    pub fn check_message(&self, text: &str) -> Result<(), NeonChatError> {
        let len = text.chars().count();
        if len > self.max_message_length {
            return Err(NeonChatError::invalid(format!(
                "message too long ({len} > {})",
                self.max_message_length
            )));
        }
        Ok(())
    }
}
