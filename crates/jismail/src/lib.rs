//! # jismail
//!
//! Send Japanese plain-text email over SMTP, encoded as ISO-2022-JP.
//!
//! This crate ties [`jismail_mime`] (message assembly) to [`jismail_smtp`]
//! (transport) behind a small session API.
//!
//! ## Quick Start
//!
//! ```ignore
//! use jismail::{Mail, Session, SmtpConfig};
//!
//! #[tokio::main]
//! async fn main() -> jismail::Result<()> {
//!     let config = SmtpConfig::new("localhost", 1025);
//!     let mail = Mail::new(
//!         "ほげ <sender@example.org>",
//!         "receipt@example.org",
//!         "テスト",
//!         "テスト本文",
//!     );
//!
//!     let mut session = Session::connect(&config).await?;
//!     session.send_mail(&mail).await?;
//!     session.quit().await
//! }
//! ```
//!
//! For a single message, [`send`] does the same in one call.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod session;

pub use config::{DEFAULT_HELO_NAME, DEFAULT_PORT, SmtpConfig};
pub use error::{Error, Result, Step};
pub use session::{Session, send};

pub use jismail_mime::{Clock, FixedClock, Mail, MessageOptions, SubjectEncoding, SystemClock};

/// Message encoding, re-exported.
pub use jismail_mime as mime;
/// SMTP transport, re-exported.
pub use jismail_smtp as smtp;
