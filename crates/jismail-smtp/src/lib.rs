//! # jismail-smtp
//!
//! A small async SMTP submission client implementing the parts of RFC 5321
//! needed to hand one message to one recipient.
//!
//! ## Features
//!
//! - **Type-state connection management**: Compile-time enforcement of valid
//!   SMTP state transitions
//! - **Greeting**: EHLO with HELO fallback
//! - **Authentication**: AUTH PLAIN (RFC 4616)
//! - **Transactions**: RSET, MAIL FROM, RCPT TO, DATA with dot-stuffing
//!
//! Connections are plain TCP. TLS is not offered.
//!
//! ## Quick Start
//!
//! ```ignore
//! use jismail_smtp::{Address, Client};
//! use jismail_smtp::connection::connect;
//!
//! #[tokio::main]
//! async fn main() -> jismail_smtp::Result<()> {
//!     let stream = connect("localhost", 25).await?;
//!     let client = Client::from_stream(stream).await?;
//!     let client = client.hello("client.example.com").await?;
//!
//!     let client = client
//!         .mail_from(Address::new("sender@example.com")?)
//!         .await?
//!         .rcpt_to(Address::new("recipient@example.com")?)
//!         .await?
//!         .data()
//!         .await?;
//!
//!     let client = client.send_message(b"Subject: Test\r\n\r\nHello\r\n").await?;
//!     client.quit().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Connection States
//!
//! ```text
//! ┌──────────────┐
//! │  Connected   │ ─── hello() / auth_plain() / reset() ───→ Connected
//! └──────────────┘
//!        │
//!        └─── mail_from() ───→ MailTransaction ───→ RecipientAdded ───→ Data
//!                                                                        │
//!            Connected ←──────────────── send_message() ─────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`command`]: SMTP command builders
//! - [`connection`]: Connection management and type-state client
//! - [`parser`]: Response parser
//! - [`types`]: Core SMTP types (addresses, extensions, replies)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use connection::{
    Client, Connected, Data, MailTransaction, RecipientAdded, ServerInfo, SmtpConnection,
};
pub use error::{Error, Result};
pub use types::{Address, AuthMechanism, Extension, Reply, ReplyClass, ReplyCode};
