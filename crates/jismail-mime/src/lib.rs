//! # jismail-mime
//!
//! ISO-2022-JP message encoding for Japanese email.
//!
//! ## Features
//!
//! - **Charset transcoding**: Unicode to ISO-2022-JP and back, always ending
//!   in ASCII state
//! - **Header encoding**: RFC 2047 `=?ISO-2022-JP?B?...?=` encoded-words,
//!   13 code points per folded line
//! - **From parsing**: `Name <addr>` split into display name and envelope
//!   address
//! - **Message assembly**: a complete 7-bit `text/plain` message ready for
//!   the SMTP DATA command
//!
//! ## Quick Start
//!
//! ```ignore
//! use jismail_mime::{Mail, SystemClock};
//!
//! let mail = Mail::new(
//!     "ほげ <sender@example.org>",
//!     "receipt@example.org",
//!     "テスト",
//!     "テスト本文",
//! );
//!
//! let message = mail.assemble(&SystemClock)?;
//! assert!(message.as_bytes().is_ascii());
//! ```
//!
//! ### Header encoding
//!
//! ```ignore
//! use jismail_mime::encoding::encode_header_field;
//!
//! let subject = encode_header_field("テスト")?;
//! assert_eq!(subject, " =?ISO-2022-JP?B?GyRCJUYlOSVIGyhC?=\r\n");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod clock;
mod error;
mod message;

pub mod charset;
pub mod encoding;

pub use address::{ParsedFrom, parse_from};
pub use clock::{Clock, DATE_FORMAT, FixedClock, SystemClock, format_date};
pub use error::{Error, Field, Result};
pub use message::{
    AssembledMessage, CONTENT_TYPE, Mail, MessageOptions, SubjectEncoding, TRANSFER_ENCODING,
    assemble, assemble_with,
};
