//! SMTP email service implementation

mod connection;
mod session;

use std::time::Duration;

use clap::Parser;
use lettre::{
    message::{header::ContentType, Mailbox},
    Message as Email,
};
use thiserror::Error;

use crate::domain::communication::{
    email_addresses::EmailAddress,
    mailer::{Mailer, MailerError, Message, Sender},
    passwords::Password,
};

pub use connection::{LettreConnector, SmtpConnector, SmtpSession};
pub use session::SessionState;

use session::Session;

/// SMTP configuration
#[derive(Clone, Debug, Parser)]
pub struct SMTPConfig {
    /// The SMTP server's hostname
    #[arg(long, env = "SMTP_SERVER")]
    pub server: String,

    /// The SMTP port; 465 is implicit-TLS submission
    #[arg(long, env = "SMTP_PORT", default_value = "465")]
    pub port: u16,

    /// The sender's email address, also used to log in
    #[arg(long, env = "SMTP_SENDER_EMAIL")]
    pub sender_email: EmailAddress,

    /// The sender's display name
    #[arg(long, env = "SMTP_SENDER_NAME")]
    pub sender_name: String,

    /// The SMTP password
    #[arg(long, env = "SMTP_PASSWORD", hide_env_values = true)]
    pub password: Password,

    /// Verify the server's TLS certificate
    #[arg(long, env = "SMTP_VERIFY_TLS", default_value = "true", action = clap::ArgAction::Set)]
    pub verify_tls: bool,

    /// Connect and I/O timeout in seconds, 0 to wait indefinitely
    #[arg(long, env = "SMTP_TIMEOUT", default_value = "60")]
    pub timeout: u64,
}

impl SMTPConfig {
    /// Check the fields the argument parsers cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.trim().is_empty() {
            return Err(ConfigError::MissingServer);
        }

        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        if self.sender_name.trim().is_empty() {
            return Err(ConfigError::MissingSenderName);
        }

        Ok(())
    }

    /// The timeout to hand to the transport
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No server was given
    #[error("the SMTP server is empty")]
    MissingServer,

    /// Port 0 cannot be connected to
    #[error("the SMTP port must be between 1 and 65535")]
    InvalidPort,

    /// No sender name was given
    #[error("the sender name is empty")]
    MissingSenderName,
}

/// Serializes a message into a plain text email ready for the transport.
///
/// The subject and body must not be blank.
pub fn format_message(message: &Message) -> Result<Email, MailerError> {
    if message.subject.trim().is_empty() {
        return Err(MailerError::InvalidMessage("the subject is empty".to_string()));
    }

    if message.body.trim().is_empty() {
        return Err(MailerError::InvalidMessage("the body is empty".to_string()));
    }

    let name = (!message.from.name.is_empty()).then(|| message.from.name.clone());

    Ok(Email::builder()
        .from(Mailbox::new(name, message.from.email.as_str().parse()?))
        .to(Mailbox::new(None, message.to.as_str().parse()?))
        .subject(message.subject.clone())
        .header(ContentType::TEXT_PLAIN)
        .body(message.body.clone())?)
}

/// SMTP mailer
#[derive(Debug)]
pub struct SMTPMailer<C = LettreConnector> {
    config: SMTPConfig,
    connector: C,
}

impl SMTPMailer {
    /// Create a new SMTP mailer connecting over implicit TLS
    pub fn new(config: SMTPConfig) -> Result<Self, ConfigError> {
        let connector =
            LettreConnector::new(&config.server, config.port, config.timeout(), config.verify_tls);

        Self::with_connector(config, connector)
    }
}

impl<C: SmtpConnector> SMTPMailer<C> {
    /// Create a new SMTP mailer using `connector` to open sessions
    pub fn with_connector(config: SMTPConfig, connector: C) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self { config, connector })
    }

    /// Build the message this mailer would send
    pub fn message(&self, to: &EmailAddress, subject: &str, body: &str) -> Message {
        let from = Sender::new(&self.config.sender_name, self.config.sender_email.clone());

        Message::new(from, to.clone(), subject, body)
    }

    /// Connect and log in without sending anything
    pub fn verify(&self) -> Result<(), MailerError> {
        let mut session = Session::open(&self.connector)?;

        session.authenticate(self.config.sender_email.as_str(), &self.config.password)?;
        session.close();

        Ok(())
    }
}

impl<C: SmtpConnector> Mailer for SMTPMailer<C> {
    fn send_email(&self, to: &EmailAddress, subject: &str, body: &str) -> Result<(), MailerError> {
        let email = format_message(&self.message(to, subject, body))?;

        let mut session = Session::open(&self.connector)?;

        session.authenticate(self.config.sender_email.as_str(), &self.config.password)?;
        session.transmit(email.envelope(), &email.formatted())?;
        session.close();

        Ok(())
    }
}
