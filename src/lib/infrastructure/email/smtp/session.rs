//! A scoped SMTP session

use std::fmt;

use lettre::address::Envelope;
use tracing::debug;

use crate::domain::communication::{mailer::MailerError, passwords::Password};

use super::connection::{SmtpConnector, SmtpSession};

/// How far a delivery has got through its single pass over the connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing has been opened yet
    NotConnected,

    /// TLS is up and the server has greeted us
    Connected,

    /// The server accepted our credentials
    Authenticated,

    /// The server accepted the message
    Sent,

    /// The connection has been released
    Closed,
}

/// Owns an open connection and closes it when dropped.
///
/// A `Session` only exists once connecting succeeded, so a failed connect
/// leaves nothing to close.
pub(super) struct Session {
    inner: Box<dyn SmtpSession>,
    state: SessionState,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Connect through `connector`
    pub fn open<C: SmtpConnector + ?Sized>(connector: &C) -> Result<Self, MailerError> {
        let inner = connector.connect()?;

        let mut session = Self {
            inner,
            state: SessionState::NotConnected,
        };
        session.advance(SessionState::Connected);

        Ok(session)
    }

    #[cfg(test)]
    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn authenticate(&mut self, username: &str, password: &Password) -> Result<(), MailerError> {
        debug_assert_eq!(self.state, SessionState::Connected);

        self.inner.authenticate(username, password)?;
        self.advance(SessionState::Authenticated);

        Ok(())
    }

    pub fn transmit(&mut self, envelope: &Envelope, email: &[u8]) -> Result<(), MailerError> {
        debug_assert_eq!(self.state, SessionState::Authenticated);

        self.inner.transmit(envelope, email)?;
        self.advance(SessionState::Sent);

        Ok(())
    }

    /// Release the connection now instead of at the end of scope
    pub fn close(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.state != SessionState::Closed {
            self.inner.close();
            self.advance(SessionState::Closed);
        }
    }

    fn advance(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "smtp session");

        self.state = next;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}
