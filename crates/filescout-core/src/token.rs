//! Callback token codec
//!
//! Follow-up buttons carry a compact, `:`-delimited payload:
//!
//! ```text
//! nav:<requester_id>:<session_key>:<offset>:<source>
//! switch:<requester_id>:<session_key>:<source>
//! ```
//!
//! No field can contain the delimiter: ids and offsets are decimal, session
//! keys use `[-0-9_]` and source names are lowercase words.

use crate::session::SessionKey;
use crate::source::Source;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Field delimiter.
pub const DELIMITER: char = ':';
/// Tag of page navigation tokens.
pub const NAV_TAG: &str = "nav";
/// Tag of source switch tokens.
pub const SWITCH_TAG: &str = "switch";
/// Payload of the inert page indicator button.
pub const PAGES_CALLBACK: &str = "pages";
/// Payload of the close button.
pub const CLOSE_CALLBACK: &str = "close";

/// Reasons a callback payload fails to decode
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// First field is not a known token tag
    #[error("unknown token tag: {0:?}")]
    UnknownTag(String),
    /// Field count does not match the tag
    #[error("{tag} token expects {expected} fields, got {found}")]
    FieldCount {
        /// Token tag
        tag: &'static str,
        /// Fields required by the tag
        expected: usize,
        /// Fields present in the payload
        found: usize,
    },
    /// Requester id is not a decimal integer
    #[error("invalid requester id: {0:?}")]
    InvalidRequester(String),
    /// Offset is not a decimal integer
    #[error("invalid offset: {0:?}")]
    InvalidOffset(String),
    /// Session key is malformed
    #[error("invalid session key: {0:?}")]
    InvalidSessionKey(String),
    /// Source name is not a known catalog
    #[error("unknown source: {0:?}")]
    UnknownSource(String),
}

/// Decoded follow-up action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationToken {
    /// Move to another page of the same source
    Nav {
        /// User who issued the original query
        requester_id: i64,
        /// Session the button belongs to
        session_key: SessionKey,
        /// Offset of the requested page
        offset: usize,
        /// Source the page is read from
        source: Source,
    },
    /// Switch to another source, starting at offset 0
    Switch {
        /// User who issued the original query
        requester_id: i64,
        /// Session the button belongs to
        session_key: SessionKey,
        /// Source to switch to
        source: Source,
    },
}

impl PaginationToken {
    /// Requester recorded in the token.
    #[must_use]
    pub const fn requester_id(&self) -> i64 {
        match self {
            Self::Nav { requester_id, .. } | Self::Switch { requester_id, .. } => *requester_id,
        }
    }

    /// Session the token refers to.
    #[must_use]
    pub const fn session_key(&self) -> SessionKey {
        match self {
            Self::Nav { session_key, .. } | Self::Switch { session_key, .. } => *session_key,
        }
    }

    /// Offset to fetch; source switches always restart at 0.
    #[must_use]
    pub const fn offset(&self) -> usize {
        match self {
            Self::Nav { offset, .. } => *offset,
            Self::Switch { .. } => 0,
        }
    }

    /// Source to fetch from.
    #[must_use]
    pub const fn source(&self) -> Source {
        match self {
            Self::Nav { source, .. } | Self::Switch { source, .. } => *source,
        }
    }

    /// Whether `actor_id` is the user the token was issued to.
    #[must_use]
    pub const fn is_issued_to(&self, actor_id: i64) -> bool {
        self.requester_id() == actor_id
    }

    /// Encode into a callback payload.
    ///
    /// # Examples
    ///
    /// ```
    /// use filescout_core::session::SessionKey;
    /// use filescout_core::source::Source;
    /// use filescout_core::token::PaginationToken;
    ///
    /// let token = PaginationToken::Nav {
    ///     requester_id: 42,
    ///     session_key: SessionKey::new(-100, 7),
    ///     offset: 10,
    ///     source: Source::Cloud,
    /// };
    /// assert_eq!(token.encode(), "nav:42:-100_7:10:cloud");
    /// assert_eq!(PaginationToken::decode(&token.encode()), Ok(token));
    /// ```
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Decode a callback payload.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenError`] describing the first malformed field.
    pub fn decode(payload: &str) -> Result<Self, TokenError> {
        payload.parse()
    }
}

impl fmt::Display for PaginationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nav {
                requester_id,
                session_key,
                offset,
                source,
            } => write!(
                f,
                "{NAV_TAG}{DELIMITER}{requester_id}{DELIMITER}{session_key}{DELIMITER}{offset}{DELIMITER}{source}"
            ),
            Self::Switch {
                requester_id,
                session_key,
                source,
            } => write!(
                f,
                "{SWITCH_TAG}{DELIMITER}{requester_id}{DELIMITER}{session_key}{DELIMITER}{source}"
            ),
        }
    }
}

impl FromStr for PaginationToken {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split(DELIMITER).collect();
        match fields.as_slice() {
            [NAV_TAG, requester, key, offset, source] => Ok(Self::Nav {
                requester_id: parse_requester(requester)?,
                session_key: parse_key(key)?,
                offset: offset
                    .parse()
                    .map_err(|_| TokenError::InvalidOffset((*offset).to_string()))?,
                source: parse_source(source)?,
            }),
            [SWITCH_TAG, requester, key, source] => Ok(Self::Switch {
                requester_id: parse_requester(requester)?,
                session_key: parse_key(key)?,
                source: parse_source(source)?,
            }),
            [NAV_TAG, ..] => Err(TokenError::FieldCount {
                tag: NAV_TAG,
                expected: 5,
                found: fields.len(),
            }),
            [SWITCH_TAG, ..] => Err(TokenError::FieldCount {
                tag: SWITCH_TAG,
                expected: 4,
                found: fields.len(),
            }),
            [tag, ..] => Err(TokenError::UnknownTag((*tag).to_string())),
            [] => Err(TokenError::UnknownTag(String::new())),
        }
    }
}

fn parse_requester(field: &str) -> Result<i64, TokenError> {
    field
        .parse()
        .map_err(|_| TokenError::InvalidRequester(field.to_string()))
}

fn parse_key(field: &str) -> Result<SessionKey, TokenError> {
    field
        .parse()
        .map_err(|_| TokenError::InvalidSessionKey(field.to_string()))
}

fn parse_source(field: &str) -> Result<Source, TokenError> {
    field
        .parse()
        .map_err(|_| TokenError::UnknownSource(field.to_string()))
}
