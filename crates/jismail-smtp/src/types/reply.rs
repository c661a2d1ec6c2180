//! Server replies.

use std::fmt;

use crate::error::{Error, Result};

/// First digit of a reply code (RFC 5321 4.2.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyClass {
    /// 2yz: the command was accepted.
    Completed,
    /// 3yz: more input is expected, as after DATA.
    Intermediate,
    /// 4yz: rejected for now, may succeed later.
    Transient,
    /// 5yz: rejected.
    Permanent,
    /// Any other first digit.
    Unknown,
}

/// Three-digit SMTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// 221 closing channel, the answer to QUIT.
    pub const CLOSING: Self = Self(221);
    /// 250 action completed.
    pub const OK: Self = Self(250);
    /// 354 start mail input.
    pub const START_DATA: Self = Self(354);
    /// 421 service not available. The server is about to close.
    pub const SERVICE_UNAVAILABLE: Self = Self(421);

    /// Wraps a numeric code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns the class given by the first digit.
    #[must_use]
    pub const fn class(self) -> ReplyClass {
        match self.0 / 100 {
            2 => ReplyClass::Completed,
            3 => ReplyClass::Intermediate,
            4 => ReplyClass::Transient,
            5 => ReplyClass::Permanent,
            _ => ReplyClass::Unknown,
        }
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A complete, possibly multi-line, server reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Code shared by every line.
    pub code: ReplyCode,
    /// Text of each line, without the code and separator.
    pub message: Vec<String>,
}

impl Reply {
    /// Creates a reply.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(code: ReplyCode, message: Vec<String>) -> Self {
        Self { code, message }
    }

    /// Returns true for 2yz replies.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code.class() == ReplyClass::Completed
    }

    /// Returns the enhanced status code (RFC 3463) of the first line, if any.
    #[must_use]
    pub fn enhanced_status(&self) -> Option<&str> {
        let first = self.first_word()?;
        let mut parts = first.split('.');
        let valid = parts.next().is_some_and(|class| matches!(class, "2" | "4" | "5"))
            && parts.clone().count() == 2
            && parts.all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()));
        valid.then_some(first)
    }

    /// Returns the first word of the first line. In a greeting or EHLO reply
    /// this is the server's hostname.
    #[must_use]
    pub fn first_word(&self) -> Option<&str> {
        self.message.first()?.split_whitespace().next()
    }

    /// Returns all lines joined with `\n`.
    #[must_use]
    pub fn message_text(&self) -> String {
        self.message.join("\n")
    }

    /// Turns a non-2yz reply into [`Error::SmtpError`].
    ///
    /// # Errors
    ///
    /// Returns the server's code and text unless the reply is a success.
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }

    /// Converts the reply into an error carrying its code and text.
    #[must_use]
    pub fn into_error(self) -> Error {
        Error::smtp_error(self.code.as_u16(), self.message_text())
    }
}
