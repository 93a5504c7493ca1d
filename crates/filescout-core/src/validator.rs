//! Search query validation
//!
//! Decides whether an inbound chat message is a search query at all.
//! Anything that is not is dropped silently by the caller.

/// Prefix that marks bot commands.
pub const COMMAND_PREFIX: char = '/';

/// Transport-neutral view of an inbound message.
///
/// Built by the transport layer from its native message type; the core only
/// needs to know whether the message has text and what else it carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchCandidate<'a> {
    /// Message text, if any
    pub text: Option<&'a str>,
    /// Message was forwarded from elsewhere
    pub is_forward: bool,
    /// Message carries a photo, video or document
    pub has_media: bool,
    /// Message entities include a URL or a text link
    pub has_link: bool,
}

impl<'a> SearchCandidate<'a> {
    /// Plain text message with no attachments.
    #[must_use]
    pub const fn text(text: &'a str) -> Self {
        Self {
            text: Some(text),
            is_forward: false,
            has_media: false,
            has_link: false,
        }
    }

    /// Mark the message as forwarded.
    #[must_use]
    pub const fn forwarded(mut self) -> Self {
        self.is_forward = true;
        self
    }

    /// Mark the message as carrying media.
    #[must_use]
    pub const fn with_media(mut self) -> Self {
        self.has_media = true;
        self
    }

    /// Mark the message as containing a link entity.
    #[must_use]
    pub const fn with_link(mut self) -> Self {
        self.has_link = true;
        self
    }
}

/// Returns `true` when the message is a legitimate search query.
///
/// # Examples
///
/// ```
/// use filescout_core::validator::{is_valid_search, SearchCandidate};
///
/// assert!(is_valid_search(&SearchCandidate::text("batman begins")));
/// assert!(!is_valid_search(&SearchCandidate::text("/start")));
/// assert!(!is_valid_search(&SearchCandidate::text("?!...")));
/// ```
#[must_use]
pub fn is_valid_search(candidate: &SearchCandidate<'_>) -> bool {
    let Some(text) = candidate.text else {
        return false;
    };
    if text.starts_with(COMMAND_PREFIX) {
        return false;
    }
    if candidate.is_forward || candidate.has_media || candidate.has_link {
        return false;
    }
    text.chars().any(char::is_alphanumeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_valid() {
        assert!(is_valid_search(&SearchCandidate::text("batman")));
        assert!(is_valid_search(&SearchCandidate::text("  Spider-Man 2 ")));
        assert!(is_valid_search(&SearchCandidate::text("Привет")));
    }

    #[test]
    fn test_rejections() {
        assert!(!is_valid_search(&SearchCandidate::default()));
        assert!(!is_valid_search(&SearchCandidate::text("/search on")));
        assert!(!is_valid_search(&SearchCandidate::text("batman").forwarded()));
        assert!(!is_valid_search(&SearchCandidate::text("batman").with_media()));
        assert!(!is_valid_search(&SearchCandidate::text("see this").with_link()));
        assert!(!is_valid_search(&SearchCandidate::text("!!! ... ???")));
        assert!(!is_valid_search(&SearchCandidate::text("")));
    }
}
