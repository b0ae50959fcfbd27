//! Mailer module

mod errors;
mod message;

#[cfg(test)]
use mockall::mock;

pub use errors::MailerError;
pub use message::{Message, Sender};

use crate::domain::communication::email_addresses::EmailAddress;

/// Email service
pub trait Mailer: Send + Sync + 'static {
    /// Send an email
    ///
    /// # Arguments
    /// * `to` - The [`EmailAddress`] to send the email to.
    /// * `subject` - The subject of the email.
    /// * `body` - The plain text body of the email.
    ///
    /// # Returns
    /// A [`Result`] indicating success or failure.
    fn send_email(&self, to: &EmailAddress, subject: &str, body: &str) -> Result<(), MailerError>;
}

#[cfg(test)]
mock! {
    pub Mailer {}

    impl Mailer for Mailer {
        fn send_email(&self, to: &EmailAddress, subject: &str, body: &str) -> Result<(), MailerError>;
    }
}
