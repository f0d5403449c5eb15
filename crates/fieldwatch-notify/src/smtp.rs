use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use tracing::debug;

use crate::alert::{Alert, Notifier};
use crate::error::{NotifyError, Result};

/// Product tag put in front of every alert subject.
pub const DEFAULT_SUBJECT_PREFIX: &str = "[FIELDWATCH]";

/// Relay and mailbox settings for [`SmtpNotifier`].
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from: String,
    /// Recipient. The authenticated user when `None`.
    pub to: Option<String>,
    pub subject_prefix: String,
    /// Upgrade the connection with STARTTLS. Plain SMTP otherwise.
    pub starttls: bool,
    /// Bound on a single delivery attempt.
    pub timeout: Duration,
}

/// Delivers each alert as a single-recipient plain-text email.
#[derive(Clone)]
pub struct SmtpNotifier {
    transport: SmtpTransport,
    from: Mailbox,
    to: Mailbox,
    subject_prefix: String,
}

impl SmtpNotifier {
    /// Parse mailboxes and prepare the relay. No connection is made until the
    /// first alert is sent.
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let from = parse_mailbox("from", &config.from)?;
        let to = parse_mailbox("to", config.to.as_deref().unwrap_or(&config.user))?;

        let builder = if config.starttls {
            SmtpTransport::starttls_relay(&config.host)?
        } else {
            SmtpTransport::builder_dangerous(&config.host)
        };
        let transport = builder
            .port(config.port)
            .credentials(Credentials::new(
                config.user.clone(),
                config.password.clone(),
            ))
            .timeout(Some(config.timeout))
            .build();

        Ok(Self {
            transport,
            from,
            to,
            subject_prefix: config.subject_prefix.clone(),
        })
    }

    /// Assemble the message for `alert` without sending it.
    pub fn message(&self, alert: &Alert) -> Result<Message> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject_line(&self.subject_prefix, alert.subject()))
            .header(ContentType::TEXT_PLAIN)
            .body(alert.body().to_string())?;
        Ok(message)
    }
}

impl Notifier for SmtpNotifier {
    fn notify(&self, alert: &Alert) -> Result<()> {
        let message = self.message(alert)?;
        let response = self.transport.send(&message)?;
        debug!(code = %response.code(), to = %self.to, "relay accepted alert");
        Ok(())
    }
}

impl std::fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("from", &self.from.to_string())
            .field("to", &self.to.to_string())
            .field("subject_prefix", &self.subject_prefix)
            .finish()
    }
}

fn parse_mailbox(field: &'static str, value: &str) -> Result<Mailbox> {
    value
        .parse::<Mailbox>()
        .map_err(|source| NotifyError::InvalidAddress {
            field,
            value: value.to_string(),
            source,
        })
}

/// Header-safe subject: the raw command usually ends in CR LF, which must not
/// reach the header.
fn subject_line(prefix: &str, subject: &str) -> String {
    let clean: String = subject.chars().filter(|c| !c.is_control()).collect();
    format!("{prefix} {}", clean.trim())
}
