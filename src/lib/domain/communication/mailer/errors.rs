//! Mailer errors

use lettre::{address::AddressError, error::Error};
use thiserror::Error;

/// Mailer errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MailerError {
    /// The server's hostname could not be resolved
    #[error("could not resolve {host}: {reason}")]
    Resolve {
        /// The hostname being looked up
        host: String,
        /// What the resolver reported
        reason: String,
        /// Whether the resolver reported a temporary failure
        transient: bool,
    },

    /// No TCP connection could be established
    #[error("could not connect to {address}: {reason}")]
    Connect {
        /// The `host:port` being connected to
        address: String,
        /// What went wrong
        reason: String,
    },

    /// The TLS handshake failed
    #[error("TLS handshake with {host} failed: {reason}")]
    Tls {
        /// The server's hostname
        host: String,
        /// What went wrong
        reason: String,
    },

    /// The server rejected the credentials
    #[error("authentication as {username} failed: {reason}")]
    Authentication {
        /// The account used to log in
        username: String,
        /// The server's reply
        reason: String,
    },

    /// The server rejected or broke off the message transfer
    #[error("an error occurred while sending the email: {reason}")]
    Transmission {
        /// The server's reply
        reason: String,
        /// Whether the reply was transient (4xx or a timeout)
        transient: bool,
    },

    /// Invalid email address
    #[error("invalid email address")]
    InvalidEmail,

    /// The message could not be built
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl MailerError {
    /// Whether trying the same delivery again later could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            MailerError::Connect { .. } => true,
            MailerError::Resolve { transient, .. } | MailerError::Transmission { transient, .. } => {
                *transient
            }
            MailerError::Tls { .. }
            | MailerError::Authentication { .. }
            | MailerError::InvalidEmail
            | MailerError::InvalidMessage(_) => false,
        }
    }
}

impl From<AddressError> for MailerError {
    fn from(_err: AddressError) -> Self {
        MailerError::InvalidEmail
    }
}

impl From<Error> for MailerError {
    fn from(err: Error) -> Self {
        MailerError::InvalidMessage(err.to_string())
    }
}
