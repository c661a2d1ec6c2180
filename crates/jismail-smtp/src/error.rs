//! Error types for SMTP operations.

use std::io;

use crate::types::{ReplyClass, ReplyCode};

/// Result type alias for SMTP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// SMTP error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The server rejected a command.
    #[error("SMTP error {code}: {message}")]
    SmtpError {
        /// Reply code.
        code: u16,
        /// Reply text, lines joined with `\n`.
        message: String,
    },

    /// The server sent something that is not a valid reply.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Server closed the connection before a complete reply.
    #[error("Connection closed by server")]
    ConnectionClosed,

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// The server lacks something this client needs.
    #[error("Server does not support {0}")]
    NotSupported(String),
}

impl Error {
    /// Creates an SMTP error from a reply code and message.
    #[must_use]
    pub fn smtp_error(code: u16, message: impl Into<String>) -> Self {
        Self::SmtpError {
            code,
            message: message.into(),
        }
    }

    /// Returns the class of the server's reply, if the server rejected the
    /// command.
    #[must_use]
    pub const fn reply_class(&self) -> Option<ReplyClass> {
        match self {
            Self::SmtpError { code, .. } => Some(ReplyCode::new(*code).class()),
            _ => None,
        }
    }

    /// Returns true for 5yz rejections. Retrying the same command will fail.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        matches!(self.reply_class(), Some(ReplyClass::Permanent))
    }

    /// Returns true for 4yz rejections.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.reply_class(), Some(ReplyClass::Transient))
    }

    /// Returns the server reply code, if the server rejected the command.
    #[must_use]
    pub const fn code(&self) -> Option<u16> {
        match self {
            Self::SmtpError { code, .. } => Some(*code),
            _ => None,
        }
    }
}
