//! Message assembly.

use crate::address::{ParsedFrom, parse_from};
use crate::charset;
use crate::clock::{Clock, format_date};
use crate::encoding::{encode_header_field, needs_encoding};
use crate::error::{Field, Result};
use std::fmt::Write as _;

/// `Content-Type` of every assembled message.
pub const CONTENT_TYPE: &str = "text/plain; charset=ISO-2022-JP";

/// `Content-Transfer-Encoding` of every assembled message.
pub const TRANSFER_ENCODING: &str = "7bit";

/// A single plain-text email.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mail {
    /// Raw From value, `Name <addr>` or a bare address.
    pub from: String,
    /// Single bare recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

impl Mail {
    /// Creates a new mail.
    #[must_use]
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Splits the From value into display name and envelope address.
    #[must_use]
    pub fn parsed_from(&self) -> ParsedFrom {
        parse_from(&self.from)
    }

    /// Assembles the message with default options.
    ///
    /// # Errors
    ///
    /// Returns an error if the display name, subject or body cannot be
    /// encoded as ISO-2022-JP.
    pub fn assemble(&self, clock: &dyn Clock) -> Result<AssembledMessage> {
        self.assemble_with(clock, MessageOptions::default())
    }

    /// Assembles the message.
    ///
    /// # Errors
    ///
    /// Returns an error if the display name, subject or body cannot be
    /// encoded as ISO-2022-JP.
    pub fn assemble_with(
        &self,
        clock: &dyn Clock,
        options: MessageOptions,
    ) -> Result<AssembledMessage> {
        assemble_with(
            &self.parsed_from(),
            &self.to,
            &self.subject,
            &self.body,
            clock,
            options,
        )
    }
}

/// How the Subject header is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SubjectEncoding {
    /// Always write encoded-words, even for plain ASCII.
    #[default]
    Always,
    /// Write printable ASCII subjects as-is.
    WhenNeeded,
}

/// Options for message assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageOptions {
    /// Subject header policy.
    #[cfg_attr(feature = "serde", serde(default))]
    pub subject: SubjectEncoding,
}

/// Header block and body ready for the DATA command.
///
/// Dot-stuffing and the terminating `.` line are left to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledMessage {
    bytes: Vec<u8>,
}

impl AssembledMessage {
    /// Returns the message bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the message, returning its bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Returns the message size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true if the message is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for AssembledMessage {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Assembles a message with default options.
///
/// # Errors
///
/// Returns an error naming the field that could not be encoded.
pub fn assemble(
    from: &ParsedFrom,
    to: &str,
    subject: &str,
    body: &str,
    clock: &dyn Clock,
) -> Result<AssembledMessage> {
    assemble_with(from, to, subject, body, clock, MessageOptions::default())
}

/// Assembles `From`, `To`, `Subject`, `Date`, `MIME-Version`,
/// `Content-Type` and `Content-Transfer-Encoding`, a blank line, then the
/// ISO-2022-JP body with a CRLF always appended.
///
/// Every field is encoded before anything is written, so a failure produces
/// no output at all.
///
/// # Errors
///
/// Returns [`Error::Field`](crate::Error::Field) wrapping the encoding error
/// of the first field that failed.
pub fn assemble_with(
    from: &ParsedFrom,
    to: &str,
    subject: &str,
    body: &str,
    clock: &dyn Clock,
    options: MessageOptions,
) -> Result<AssembledMessage> {
    let from_value = from_header_value(from).map_err(|e| e.in_field(Field::From))?;
    let subject_value =
        subject_header_value(subject, options.subject).map_err(|e| e.in_field(Field::Subject))?;
    let body = charset::encode(&format!("{body}\r\n")).map_err(|e| e.in_field(Field::Body))?;
    let date = format_date(&clock.now());

    let mut head = String::with_capacity(256 + from_value.len() + subject_value.len());
    let _ = write!(head, "From: {from_value}\r\n");
    let _ = write!(head, "To: {to}\r\n");
    let _ = write!(head, "Subject:{subject_value}");
    let _ = write!(head, "Date: {date}\r\n");
    head.push_str("MIME-Version: 1.0\r\n");
    let _ = write!(head, "Content-Type: {CONTENT_TYPE}\r\n");
    let _ = write!(head, "Content-Transfer-Encoding: {TRANSFER_ENCODING}\r\n");
    head.push_str("\r\n");

    let mut bytes = head.into_bytes();
    bytes.extend_from_slice(&body);
    Ok(AssembledMessage { bytes })
}

/// Encoded display name followed by `<addr>`, or the bare address.
fn from_header_value(from: &ParsedFrom) -> Result<String> {
    match &from.display_name {
        Some(name) => Ok(format!(
            "{} <{}>",
            encode_header_field(name)?,
            from.envelope_address
        )),
        None => Ok(from.envelope_address.clone()),
    }
}

/// Value written right after `Subject:`, including its line ending.
fn subject_header_value(subject: &str, policy: SubjectEncoding) -> Result<String> {
    if policy == SubjectEncoding::WhenNeeded && !needs_encoding(subject) {
        return Ok(format!(" {subject}\r\n"));
    }
    let encoded = encode_header_field(subject)?;
    if encoded.is_empty() {
        return Ok("\r\n".to_string());
    }
    Ok(encoded)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::encoding::decode_header_field;
    use crate::error::Error;

    fn clock() -> FixedClock {
        FixedClock::parse("2024-03-09T08:00:00+09:00").unwrap()
    }

    fn header_block(message: &AssembledMessage) -> String {
        let text = String::from_utf8(message.as_bytes().to_vec()).unwrap();
        text.split("\r\n\r\n").next().unwrap().to_string()
    }

    fn body_bytes(message: &AssembledMessage) -> Vec<u8> {
        let bytes = message.as_bytes();
        let pos = bytes.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
        bytes[pos + 4..].to_vec()
    }

    #[test]
    fn test_assemble_exact_bytes() {
        let mail = Mail::new("N <n@x.io>", "to@example.org", "hi", "X");
        let message = mail.assemble(&clock()).unwrap();
        let expected = concat!(
            "From:  =?ISO-2022-JP?B?TiA=?=\r\n <n@x.io>\r\n",
            "To: to@example.org\r\n",
            "Subject: =?ISO-2022-JP?B?aGk=?=\r\n",
            "Date: Sat, 09 Mar 2024 08:00:00 +0900\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: text/plain; charset=ISO-2022-JP\r\n",
            "Content-Transfer-Encoding: 7bit\r\n",
            "\r\n",
            "X\r\n",
        );
        assert_eq!(message.as_bytes(), expected.as_bytes());
    }

    #[test]
    fn test_header_order() {
        let mail = Mail::new("a@b.c", "d@e.f", "件名", "本文");
        let message = mail.assemble(&clock()).unwrap();
        let names: Vec<String> = header_block(&message)
            .split("\r\n")
            .filter(|line| !line.starts_with(' '))
            .map(|line| line.split(':').next().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "From",
                "To",
                "Subject",
                "Date",
                "MIME-Version",
                "Content-Type",
                "Content-Transfer-Encoding"
            ]
        );
    }

    #[test]
    fn test_bare_from_is_not_encoded() {
        let mail = Mail::new("a@b.c", "d@e.f", "s", "b");
        let message = mail.assemble(&clock()).unwrap();
        assert!(header_block(&message).starts_with("From: a@b.c\r\nTo: d@e.f\r\n"));
    }

    #[test]
    fn test_display_name_is_encoded() {
        let mail = Mail::new("ほげ <sender@example.org>", "d@e.f", "s", "b");
        let message = mail.assemble(&clock()).unwrap();
        let block = header_block(&message);
        assert!(block.starts_with("From:  =?ISO-2022-JP?B?GyRCJFskMhsoQiA=?=\r\n <sender@example.org>\r\n"));
    }

    #[test]
    fn test_subject_round_trips() {
        let subject = "テストおおおおおお。あああいいいいんんんaいいう1234あああああああああああいいいいいいいいいいう";
        let mail = Mail::new("a@b.c", "d@e.f", subject, "b");
        let block = header_block(&mail.assemble(&clock()).unwrap());
        let start = block.find("Subject:").unwrap() + "Subject:".len();
        let end = block.find("\r\nDate:").unwrap();
        assert_eq!(decode_header_field(&block[start..end]).unwrap(), subject);
    }

    #[test]
    fn test_body_always_gets_crlf() {
        let mail = Mail::new("a@b.c", "d@e.f", "s", "X");
        assert_eq!(body_bytes(&mail.assemble(&clock()).unwrap()), b"X\r\n");

        let mail = Mail::new("a@b.c", "d@e.f", "s", "X\r\n");
        assert_eq!(body_bytes(&mail.assemble(&clock()).unwrap()), b"X\r\n\r\n");
    }

    #[test]
    fn test_body_is_transcoded() {
        let mail = Mail::new("a@b.c", "d@e.f", "s", "テスト本文");
        let message = mail.assemble(&clock()).unwrap();
        assert_eq!(body_bytes(&message), b"\x1b$B%F%9%HK\\J8\x1b(B\r\n");
        assert!(message.as_bytes().iter().all(|b| *b < 0x80));
    }

    #[test]
    fn test_empty_subject_keeps_header_line() {
        let mail = Mail::new("a@b.c", "d@e.f", "", "b");
        let block = header_block(&mail.assemble(&clock()).unwrap());
        assert!(block.contains("\r\nSubject:\r\nDate: "));
    }

    #[test]
    fn test_subject_when_needed_leaves_ascii_plain() {
        let mail = Mail::new("a@b.c", "d@e.f", "Weekly report", "b");
        let options = MessageOptions {
            subject: SubjectEncoding::WhenNeeded,
        };
        let block = header_block(&mail.assemble_with(&clock(), options).unwrap());
        assert!(block.contains("\r\nSubject: Weekly report\r\n"));

        let mail = Mail::new("a@b.c", "d@e.f", "週報", "b");
        let block = header_block(&mail.assemble_with(&clock(), options).unwrap());
        assert!(block.contains("\r\nSubject: =?ISO-2022-JP?B?"));
    }

    #[test]
    fn test_unmappable_subject_fails() {
        let mail = Mail::new("a@b.c", "d@e.f", "party 🎉", "b");
        let err = mail.assemble(&clock()).unwrap_err();
        assert_eq!(err.field(), Some(Field::Subject));
        assert_eq!(err.unmappable(), Some(('🎉', 6)));
    }

    #[test]
    fn test_unmappable_display_name_fails() {
        let mail = Mail::new("김 <a@b.c>", "d@e.f", "s", "b");
        let err = mail.assemble(&clock()).unwrap_err();
        assert_eq!(err.field(), Some(Field::From));
    }

    #[test]
    fn test_unmappable_body_fails() {
        let mail = Mail::new("a@b.c", "d@e.f", "s", "ok\n😀");
        let err = mail.assemble(&clock()).unwrap_err();
        assert!(matches!(
            err,
            Error::Field {
                field: Field::Body,
                ..
            }
        ));
        assert_eq!(err.unmappable(), Some(('😀', 3)));
    }

    #[test]
    fn test_assemble_free_function_matches_method() {
        let mail = Mail::new("N <n@x.io>", "to@example.org", "件名", "本文");
        let parsed = parse_from(&mail.from);
        let direct = assemble(&parsed, &mail.to, &mail.subject, &mail.body, &clock()).unwrap();
        assert_eq!(direct, mail.assemble(&clock()).unwrap());
        assert_eq!(direct.len(), direct.as_bytes().len());
        assert!(!direct.is_empty());
    }
}
