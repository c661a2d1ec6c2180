//! Type-state SMTP client.

use super::{ServerInfo, SmtpStream};
use crate::command::{Command, encode_data};
use crate::error::{Error, Result};
use crate::parser::{is_last_reply_line, parse_reply};
use crate::types::{Address, AuthMechanism, Extension, Reply, ReplyCode};
use base64::Engine;
use std::collections::HashSet;
use std::marker::PhantomData;
use tracing::debug;

/// Most lines accepted in one multi-line reply.
const MAX_REPLY_LINES: usize = 512;

/// Idle session, ready to greet, authenticate or start a transaction.
#[derive(Debug)]
pub struct Connected;

/// `MAIL FROM` accepted.
#[derive(Debug)]
pub struct MailTransaction;

/// `RCPT TO` accepted.
#[derive(Debug)]
pub struct RecipientAdded;

/// `DATA` accepted; the message goes next.
#[derive(Debug)]
pub struct Data;

/// SMTP client whose type tracks where it is in the transaction.
///
/// Every step consumes the client and returns it in the next state, so a
/// failed step leaves nothing to reuse. Dropping a client in any state
/// closes the TCP connection.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    server_info: ServerInfo,
    _state: PhantomData<State>,
}

/// Access shared by every client state.
pub trait SmtpConnection {
    /// Returns what the server announced.
    fn server_info(&self) -> &ServerInfo;
}

impl<S> SmtpConnection for Client<S> {
    fn server_info(&self) -> &ServerInfo {
        &self.server_info
    }
}

impl Client<Connected> {
    /// Reads the server greeting from a fresh connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the greeting cannot be read or is not 2yz.
    pub async fn from_stream(mut stream: SmtpStream) -> Result<Self> {
        let greeting = read_reply(&mut stream).await?.into_result()?;
        let hostname = greeting.first_word().unwrap_or("unknown").to_string();
        debug!(code = greeting.code.as_u16(), server = %hostname, "SMTP greeting");

        Ok(Self {
            stream,
            server_info: ServerInfo {
                hostname,
                extensions: HashSet::new(),
                authenticated: false,
            },
            _state: PhantomData,
        })
    }

    /// Sends EHLO, or HELO if the server rejects EHLO.
    ///
    /// Extensions from an EHLO reply are recorded in [`ServerInfo`]; after a
    /// HELO fallback none are known.
    ///
    /// # Errors
    ///
    /// Returns an error if EHLO is answered with 421, or if HELO is rejected
    /// too.
    pub async fn hello(mut self, client_hostname: &str) -> Result<Self> {
        let hostname = client_hostname.to_string();
        let reply = self.command(Command::Ehlo { hostname }).await?;

        if reply.is_success() {
            // The first line is the server greeting
            self.server_info.extensions = reply
                .message
                .iter()
                .skip(1)
                .map(|line| Extension::parse(line))
                .collect();
            return Ok(self);
        }
        if reply.code == ReplyCode::SERVICE_UNAVAILABLE {
            return Err(reply.into_error());
        }

        debug!(code = reply.code.as_u16(), "EHLO rejected, trying HELO");
        let hostname = client_hostname.to_string();
        self.expect_success(Command::Helo { hostname }).await?;
        self.server_info.extensions.clear();
        Ok(self)
    }

    /// Authenticates with AUTH PLAIN (RFC 4616), sending the credentials as
    /// the initial response.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the credentials.
    pub async fn auth_plain(mut self, username: &str, password: &str) -> Result<Self> {
        let token = format!("\0{username}\0{password}");
        let initial_response = base64::engine::general_purpose::STANDARD.encode(token);

        self.expect_success(Command::Auth {
            mechanism: AuthMechanism::Plain,
            initial_response: Some(initial_response),
        })
        .await?;

        self.server_info.authenticated = true;
        Ok(self)
    }

    /// Sends RSET, clearing any transaction state on the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects RSET.
    pub async fn reset(mut self) -> Result<Self> {
        self.expect_success(Command::Rset).await?;
        Ok(self)
    }

    /// Starts a transaction with `MAIL FROM`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the sender.
    pub async fn mail_from(mut self, from: Address) -> Result<Client<MailTransaction>> {
        self.expect_success(Command::MailFrom { from }).await?;
        Ok(self.into_state())
    }
}

impl Client<MailTransaction> {
    /// Names the recipient with `RCPT TO`.
    ///
    /// # Errors
    ///
    /// Returns an error if the server rejects the recipient.
    pub async fn rcpt_to(mut self, to: Address) -> Result<Client<RecipientAdded>> {
        self.expect_success(Command::RcptTo { to }).await?;
        Ok(self.into_state())
    }
}

impl Client<RecipientAdded> {
    /// Sends DATA and waits for the 354 go-ahead.
    ///
    /// # Errors
    ///
    /// Returns an error if the server answers anything but 354.
    pub async fn data(mut self) -> Result<Client<Data>> {
        let reply = self.command(Command::Data).await?;
        if reply.code != ReplyCode::START_DATA {
            return Err(reply.into_error());
        }
        Ok(self.into_state())
    }
}

impl Client<Data> {
    /// Sends the message and the terminating `.` line.
    ///
    /// Bytes go out unchanged apart from CRLF normalization and
    /// dot-stuffing.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails or the server rejects the message.
    pub async fn send_message(mut self, message: &[u8]) -> Result<Client<Connected>> {
        let data = encode_data(message);
        debug!(bytes = data.len(), "Sending message data");
        self.stream.write_all(&data).await?;

        let reply = read_reply(&mut self.stream).await?;
        debug!(
            code = reply.code.as_u16(),
            status = reply.enhanced_status(),
            "End of data"
        );
        reply.into_result()?;
        Ok(self.into_state())
    }
}

impl<S> Client<S> {
    /// Sends QUIT and closes the connection. Available in every state.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not answer QUIT with 2yz, or if
    /// closing the stream fails.
    pub async fn quit(mut self) -> Result<()> {
        self.expect_success(Command::Quit).await?;
        self.stream.shutdown().await
    }

    async fn command(&mut self, command: Command) -> Result<Reply> {
        self.stream.write_all(&command.serialize()).await?;
        let reply = read_reply(&mut self.stream).await?;
        debug!(
            verb = command.verb(),
            code = reply.code.as_u16(),
            status = reply.enhanced_status(),
            "SMTP command"
        );
        Ok(reply)
    }

    async fn expect_success(&mut self, command: Command) -> Result<Reply> {
        self.command(command).await?.into_result()
    }

    fn into_state<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            server_info: self.server_info,
            _state: PhantomData,
        }
    }
}

/// Reads lines up to and including the last line of one reply.
async fn read_reply(stream: &mut SmtpStream) -> Result<Reply> {
    let mut lines = Vec::new();
    loop {
        let line = stream.read_line().await?;
        if line.is_empty() {
            continue;
        }
        let last = is_last_reply_line(&line);
        lines.push(line);
        if last {
            return parse_reply(&lines);
        }
        if lines.len() >= MAX_REPLY_LINES {
            return Err(Error::Protocol(format!(
                "Reply exceeds {MAX_REPLY_LINES} lines"
            )));
        }
    }
}
