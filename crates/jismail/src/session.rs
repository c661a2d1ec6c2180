//! SMTP session for sending ISO-2022-JP mail.
//!
//! A [`Session`] owns one connection. Each [`Session::send_mail`] assembles
//! the message first, so an encoding failure never reaches the wire, then
//! runs RSET, MAIL FROM, RCPT TO and DATA. A transport failure drops the
//! connection and leaves the session closed.

use std::fmt;

use jismail_mime::{Clock, Mail, MessageOptions, SystemClock};
use jismail_smtp::connection::connect;
use jismail_smtp::{Address, AuthMechanism, Client, Connected, ServerInfo, SmtpConnection};
use tracing::{debug, info, warn};

use crate::config::SmtpConfig;
use crate::error::{Error, Result, Step};

/// An open SMTP session.
pub struct Session {
    client: Option<Client<Connected>>,
    clock: Box<dyn Clock>,
    options: MessageOptions,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("open", &self.is_open())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Connects, greets the server and authenticates if configured.
    ///
    /// AUTH PLAIN is used only when a username is configured and the server
    /// advertises AUTH. Otherwise the session continues unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unusable configuration, or
    /// [`Error::Transport`] naming the step that failed.
    pub async fn connect(config: &SmtpConfig) -> Result<Self> {
        config.validate()?;

        info!(host = %config.host, port = config.port, "Connecting to SMTP server");
        let stream = connect(&config.host, config.port)
            .await
            .map_err(Error::at(Step::Connect))?;
        let client = Client::from_stream(stream)
            .await
            .map_err(Error::at(Step::Connect))?;
        let client = client
            .hello(&config.helo_name)
            .await
            .map_err(Error::at(Step::Hello))?;

        let client = match config.credentials() {
            Some((username, password)) if client.server_info().supports_auth() => {
                let mechanisms = client.server_info().auth_mechanisms();
                if !mechanisms.is_empty() && !mechanisms.contains(&AuthMechanism::Plain) {
                    return Err(Error::at(Step::Auth)(jismail_smtp::Error::NotSupported(
                        "AUTH PLAIN".into(),
                    )));
                }
                debug!("Authenticating with AUTH PLAIN");
                client
                    .auth_plain(username, password)
                    .await
                    .map_err(Error::at(Step::Auth))?
            }
            Some(_) => {
                warn!("Server does not advertise AUTH, continuing without authentication");
                client
            }
            None => client,
        };

        info!(server = %client.server_info().hostname, "SMTP session ready");
        Ok(Self {
            client: Some(client),
            clock: Box::new(SystemClock),
            options: MessageOptions::default(),
        })
    }

    /// Replaces the clock used for the Date header.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Sets message assembly options.
    #[must_use]
    pub fn with_options(mut self, options: MessageOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns true until a transport failure or `quit`.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.client.is_some()
    }

    /// Returns what the server advertised, while the session is open.
    #[must_use]
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.client.as_ref().map(SmtpConnection::server_info)
    }

    /// Sends one mail.
    ///
    /// The envelope sender is the address part of `mail.from`; the single
    /// envelope recipient is `mail.to`.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionClosed`] if the session is no longer open.
    /// - [`Error::Encoding`] if the display name, subject or body cannot be
    ///   encoded. Nothing is sent and the session stays open.
    /// - [`Error::Transport`] if an address is invalid (nothing is sent and
    ///   the session stays open) or the server rejects a step (the session
    ///   is closed).
    pub async fn send_mail(&mut self, mail: &Mail) -> Result<()> {
        if !self.is_open() {
            return Err(Error::SessionClosed);
        }

        let message = mail.assemble_with(self.clock.as_ref(), self.options)?;
        debug!(bytes = message.len(), "Assembled message");
        if let Some(limit) = self
            .server_info()
            .and_then(ServerInfo::max_message_size)
            .filter(|limit| message.len() > *limit)
        {
            warn!(bytes = message.len(), limit, "Message exceeds the advertised SIZE");
        }

        let from = Address::new(mail.parsed_from().envelope_address)
            .map_err(Error::at(Step::MailFrom))?;
        let to = Address::new(mail.to.as_str()).map_err(Error::at(Step::RcptTo))?;

        let client = self.client.take().ok_or(Error::SessionClosed)?;
        let client = transact(client, from, to, message.as_bytes()).await?;
        self.client = Some(client);

        info!(to = %mail.to, bytes = message.len(), "Message accepted");
        Ok(())
    }

    /// Sends QUIT and closes the connection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionClosed`] if the session already failed, or
    /// [`Error::Transport`] if QUIT fails. The connection is closed either way.
    pub async fn quit(mut self) -> Result<()> {
        let client = self.client.take().ok_or(Error::SessionClosed)?;
        client.quit().await.map_err(Error::at(Step::Quit))?;
        debug!("SMTP session closed");
        Ok(())
    }
}

/// Runs one mail transaction. On error the client is dropped, closing the
/// connection.
async fn transact(
    client: Client<Connected>,
    from: Address,
    to: Address,
    message: &[u8],
) -> Result<Client<Connected>> {
    let client = client.reset().await.map_err(Error::at(Step::Reset))?;
    let client = client
        .mail_from(from)
        .await
        .map_err(Error::at(Step::MailFrom))?;
    let client = client.rcpt_to(to).await.map_err(Error::at(Step::RcptTo))?;
    let client = client.data().await.map_err(Error::at(Step::Data))?;
    client
        .send_message(message)
        .await
        .map_err(Error::at(Step::Message))
}

/// Connects, sends one mail and quits.
///
/// # Errors
///
/// Returns the first error from [`Session::connect`],
/// [`Session::send_mail`] or [`Session::quit`].
pub async fn send(config: &SmtpConfig, mail: &Mail) -> Result<()> {
    let mut session = Session::connect(config).await?;
    session.send_mail(mail).await?;
    session.quit().await
}
