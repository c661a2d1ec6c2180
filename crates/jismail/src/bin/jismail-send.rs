//! Sends one ISO-2022-JP mail described by a JSON file.
//!
//! ```text
//! jismail-send config.json
//! ```
//!
//! The file holds `{ "smtp": { ... }, "mail": { ... }, "options": { ... } }`;
//! `options` is optional.

use std::path::PathBuf;

use anyhow::Context;
use jismail::{Mail, MessageOptions, Session, SmtpConfig};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Deserialize)]
struct SendConfig {
    #[serde(default)]
    smtp: SmtpConfig,
    mail: Mail,
    #[serde(default)]
    options: MessageOptions,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jismail=info,jismail_smtp=info,jismail_send=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: jismail-send <config.json>")?;

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: SendConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let mut session = Session::connect(&config.smtp)
        .await
        .context("Failed to open SMTP session")?
        .with_options(config.options);
    session
        .send_mail(&config.mail)
        .await
        .context("Failed to send mail")?;
    session.quit().await.context("Failed to close SMTP session")?;

    info!(to = %config.mail.to, "Mail sent");
    Ok(())
}
