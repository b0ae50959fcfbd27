//! Email message

use crate::domain::communication::email_addresses::EmailAddress;

/// The person an email is sent from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sender {
    /// The display name shown alongside the address
    pub name: String,

    /// The sender's email address
    pub email: EmailAddress,
}

impl Sender {
    /// Create a new sender
    pub fn new(name: &str, email: EmailAddress) -> Self {
        Self {
            name: name.trim().to_string(),
            email,
        }
    }
}

/// A plain text email with exactly one recipient
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// The sender of the email
    pub from: Sender,

    /// The recipient of the email
    pub to: EmailAddress,

    /// The subject of the email
    pub subject: String,

    /// The plain text body of the email
    pub body: String,
}

impl Message {
    /// Create a new message
    pub fn new(from: Sender, to: EmailAddress, subject: &str, body: &str) -> Self {
        Self {
            from,
            to,
            subject: subject.to_string(),
            body: body.to_string(),
        }
    }
}
