//! Error types for sending mail.

use std::fmt;

use thiserror::Error;

/// The SMTP step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Opening the connection or reading the greeting.
    Connect,
    /// EHLO/HELO.
    Hello,
    /// AUTH PLAIN.
    Auth,
    /// RSET.
    Reset,
    /// MAIL FROM.
    MailFrom,
    /// RCPT TO.
    RcptTo,
    /// DATA.
    Data,
    /// Message content and end of data.
    Message,
    /// QUIT.
    Quit,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Connect => "connect",
            Self::Hello => "EHLO/HELO",
            Self::Auth => "AUTH",
            Self::Reset => "RSET",
            Self::MailFrom => "MAIL FROM",
            Self::RcptTo => "RCPT TO",
            Self::Data => "DATA",
            Self::Message => "message data",
            Self::Quit => "QUIT",
        })
    }
}

/// Errors that can occur while sending mail.
#[derive(Debug, Error)]
pub enum Error {
    /// A header or the body could not be encoded; nothing was sent.
    #[error("Encoding failed: {0}")]
    Encoding(#[from] jismail_mime::Error),

    /// An SMTP step failed.
    #[error("SMTP {step} failed: {source}")]
    Transport {
        /// Step that failed.
        step: Step,
        /// Underlying transport error.
        #[source]
        source: jismail_smtp::Error,
    },

    /// The session was closed by a previous failure or by `quit`.
    #[error("SMTP session is closed")]
    SessionClosed,

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns a mapper that tags transport errors with `step`.
    pub(crate) fn at(step: Step) -> impl FnOnce(jismail_smtp::Error) -> Self {
        move |source| Self::Transport { step, source }
    }

    /// Returns the failed SMTP step, for transport errors.
    #[must_use]
    pub const fn step(&self) -> Option<Step> {
        match self {
            Self::Transport { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Returns the server reply code, if the server rejected a command.
    #[must_use]
    pub const fn smtp_code(&self) -> Option<u16> {
        match self {
            Self::Transport { source, .. } => source.code(),
            _ => None,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_display() {
        let err = Error::at(Step::RcptTo)(jismail_smtp::Error::smtp_error(550, "No such user"));
        assert_eq!(err.step(), Some(Step::RcptTo));
        assert_eq!(err.smtp_code(), Some(550));
        assert_eq!(
            err.to_string(),
            "SMTP RCPT TO failed: SMTP error 550: No such user"
        );
    }

    #[test]
    fn test_non_transport_errors() {
        assert_eq!(Error::SessionClosed.step(), None);
        assert_eq!(Error::Config("x".into()).smtp_code(), None);
    }
}
