//! Command lines and DATA content.

use crate::types::{Address, AuthMechanism};

/// A command the client sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `HELO <hostname>`.
    Helo {
        /// Client hostname.
        hostname: String,
    },
    /// `EHLO <hostname>`.
    Ehlo {
        /// Client hostname.
        hostname: String,
    },
    /// `AUTH <mechanism> [initial-response]`.
    Auth {
        /// SASL mechanism.
        mechanism: AuthMechanism,
        /// Base64 initial response (RFC 4954), if any.
        initial_response: Option<String>,
    },
    /// `MAIL FROM:<address>`.
    MailFrom {
        /// Envelope sender.
        from: Address,
    },
    /// `RCPT TO:<address>`.
    RcptTo {
        /// Envelope recipient.
        to: Address,
    },
    /// `DATA`.
    Data,
    /// `RSET`.
    Rset,
    /// `QUIT`.
    Quit,
}

impl Command {
    /// Returns the full command line including CRLF.
    ///
    /// The AUTH line carries credentials; log [`Command::verb`] instead.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut line = match self {
            Self::Helo { hostname } | Self::Ehlo { hostname } => {
                format!("{} {hostname}", self.verb())
            }
            Self::Auth {
                mechanism,
                initial_response: Some(response),
            } => format!("AUTH {} {response}", mechanism.name()),
            Self::Auth {
                mechanism,
                initial_response: None,
            } => format!("AUTH {}", mechanism.name()),
            Self::MailFrom { from } => format!("MAIL FROM:<{from}>"),
            Self::RcptTo { to } => format!("RCPT TO:<{to}>"),
            Self::Data | Self::Rset | Self::Quit => self.verb().to_string(),
        };
        line.push_str("\r\n");
        line.into_bytes()
    }

    /// Returns the command verb without arguments.
    #[must_use]
    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Helo { .. } => "HELO",
            Self::Ehlo { .. } => "EHLO",
            Self::Auth { .. } => "AUTH",
            Self::MailFrom { .. } => "MAIL",
            Self::RcptTo { .. } => "RCPT",
            Self::Data => "DATA",
            Self::Rset => "RSET",
            Self::Quit => "QUIT",
        }
    }
}

/// Prepares message content for transmission after DATA (RFC 5321 4.5.2).
///
/// Line endings are normalized to CRLF, lines starting with `.` get an extra
/// leading `.`, and the terminating `.` line is appended. A message that
/// already ends with a line break does not gain an extra empty line.
#[must_use]
pub fn encode_data(message: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(message.len() + message.len() / 32 + 5);

    if !message.is_empty() {
        let content = message.strip_suffix(b"\n").unwrap_or(message);
        for line in content.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.starts_with(b".") {
                data.push(b'.');
            }
            data.extend_from_slice(line);
            data.extend_from_slice(b"\r\n");
        }
    }

    data.extend_from_slice(b".\r\n");
    data
}
