//! Error types for message encoding.

use std::fmt;

/// Result type alias for encoding operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Part of the message that failed to encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Display name of the From header.
    From,
    /// Subject header.
    Subject,
    /// Message body.
    Body,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::From => write!(f, "From header"),
            Self::Subject => write!(f, "Subject header"),
            Self::Body => write!(f, "body"),
        }
    }
}

/// Encoding error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A character has no ISO-2022-JP representation.
    #[error("Character {character:?} at position {position} cannot be encoded as ISO-2022-JP")]
    Unmappable {
        /// The offending character.
        character: char,
        /// Code point index of the character in the encoded text.
        position: usize,
    },

    /// Input bytes are not valid ISO-2022-JP.
    #[error("Malformed ISO-2022-JP data")]
    Malformed,

    /// Header value is not an ISO-2022-JP base64 encoded-word.
    #[error("Invalid encoded word: {0}")]
    InvalidEncodedWord(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Encoding failed for one part of an assembled message.
    #[error("Failed to encode {field}: {source}")]
    Field {
        /// Which part of the message failed.
        field: Field,
        /// Underlying encoding error.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Returns the unmappable character and its position, looking through
    /// field context.
    #[must_use]
    pub fn unmappable(&self) -> Option<(char, usize)> {
        match self {
            Self::Unmappable {
                character,
                position,
            } => Some((*character, *position)),
            Self::Field { source, .. } => source.unmappable(),
            _ => None,
        }
    }

    /// Returns the message part this error is attached to, if any.
    #[must_use]
    pub const fn field(&self) -> Option<Field> {
        match self {
            Self::Field { field, .. } => Some(*field),
            _ => None,
        }
    }

    pub(crate) fn in_field(self, field: Field) -> Self {
        Self::Field {
            field,
            source: Box::new(self),
        }
    }

    /// Shifts an unmappable position by the number of code points that
    /// preceded the encoded slice.
    pub(crate) fn offset_by(self, offset: usize) -> Self {
        match self {
            Self::Unmappable {
                character,
                position,
            } => Self::Unmappable {
                character,
                position: position + offset,
            },
            other => other,
        }
    }
}
