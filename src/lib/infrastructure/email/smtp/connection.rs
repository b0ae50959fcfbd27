//! SMTP connections over implicit TLS

use std::{
    error::Error,
    fmt, io,
    net::{SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

use lettre::{
    address::Envelope,
    transport::smtp::{
        authentication::{Credentials, Mechanism},
        client::{SmtpConnection, TlsParameters},
        extension::ClientId,
    },
};
#[cfg(test)]
use mockall::mock;
use tracing::{debug, warn};

use crate::domain::communication::{mailer::MailerError, passwords::Password};

const MECHANISMS: &[Mechanism] = &[Mechanism::Plain, Mechanism::Login];

/// Whether a TLS error sits anywhere in `err`'s source chain.
///
/// lettre files native-tls handshake failures under connection errors, so
/// `is_tls` alone misses them.
fn is_tls_failure(err: &(dyn Error + 'static)) -> bool {
    let mut current = Some(err);

    while let Some(err) = current {
        if err.is::<native_tls::Error>() || err.is::<native_tls::HandshakeError<TcpStream>>() {
            return true;
        }

        current = err.source();
    }

    false
}

/// Whether a failed lookup may succeed if tried again
fn is_temporary_lookup_failure(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    ) || err
        .to_string()
        .to_lowercase()
        .contains("temporary failure in name resolution")
}

/// An established SMTP session
pub trait SmtpSession {
    /// Log in to the server
    fn authenticate(&mut self, username: &str, password: &Password) -> Result<(), MailerError>;

    /// Hand a serialized message to the server
    fn transmit(&mut self, envelope: &Envelope, email: &[u8]) -> Result<(), MailerError>;

    /// End the session. Failures are logged, never returned.
    fn close(&mut self);
}

/// Opens SMTP sessions
pub trait SmtpConnector: Send + Sync + 'static {
    /// Connect to the server and complete the TLS handshake and greeting
    fn connect(&self) -> Result<Box<dyn SmtpSession>, MailerError>;
}

#[cfg(test)]
mock! {
    pub SmtpSession {}

    impl SmtpSession for SmtpSession {
        fn authenticate(&mut self, username: &str, password: &Password) -> Result<(), MailerError>;
        fn transmit(&mut self, envelope: &Envelope, email: &[u8]) -> Result<(), MailerError>;
        fn close(&mut self);
    }
}

#[cfg(test)]
mock! {
    pub SmtpConnector {}

    impl SmtpConnector for SmtpConnector {
        fn connect(&self) -> Result<Box<dyn SmtpSession>, MailerError>;
    }
}

/// Connects with lettre, wrapping the socket in TLS before the greeting
#[derive(Debug, Clone)]
pub struct LettreConnector {
    host: String,
    port: u16,
    timeout: Option<Duration>,
    verify_tls: bool,
}

impl LettreConnector {
    /// Create a new connector
    pub fn new(host: &str, port: u16, timeout: Option<Duration>, verify_tls: bool) -> Self {
        Self {
            host: host.trim().to_string(),
            port,
            timeout,
            verify_tls,
        }
    }

    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn resolve(&self) -> Result<Vec<SocketAddr>, MailerError> {
        let addresses: Vec<SocketAddr> = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|err| MailerError::Resolve {
                host: self.host.clone(),
                reason: err.to_string(),
                transient: is_temporary_lookup_failure(&err),
            })?
            .collect();

        if addresses.is_empty() {
            return Err(MailerError::Resolve {
                host: self.host.clone(),
                reason: "no addresses found".to_string(),
                transient: false,
            });
        }

        Ok(addresses)
    }

    fn tls_parameters(&self) -> Result<TlsParameters, MailerError> {
        TlsParameters::builder(self.host.clone())
            .dangerous_accept_invalid_certs(!self.verify_tls)
            .build()
            .map_err(|err| MailerError::Tls {
                host: self.host.clone(),
                reason: err.to_string(),
            })
    }
}

impl SmtpConnector for LettreConnector {
    fn connect(&self) -> Result<Box<dyn SmtpSession>, MailerError> {
        let addresses = self.resolve()?;
        let tls = self.tls_parameters()?;

        debug!(address = %self.address(), resolved = ?addresses, "connecting");

        let connection = SmtpConnection::connect(
            addresses.as_slice(),
            self.timeout,
            &ClientId::default(),
            Some(&tls),
            None,
        )
        .map_err(|err| {
            if err.is_tls() || is_tls_failure(&err) {
                MailerError::Tls {
                    host: self.host.clone(),
                    reason: err.to_string(),
                }
            } else {
                MailerError::Connect {
                    address: self.address(),
                    reason: err.to_string(),
                }
            }
        })?;

        Ok(Box::new(LettreSession {
            address: self.address(),
            connection,
        }))
    }
}

struct LettreSession {
    address: String,
    connection: SmtpConnection,
}

impl fmt::Debug for LettreSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LettreSession")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl SmtpSession for LettreSession {
    fn authenticate(&mut self, username: &str, password: &Password) -> Result<(), MailerError> {
        let credentials = Credentials::new(username.to_string(), password.expose().to_string());

        self.connection
            .auth(MECHANISMS, &credentials)
            .map(|_| ())
            .map_err(|err| MailerError::Authentication {
                username: username.to_string(),
                reason: err.to_string(),
            })
    }

    fn transmit(&mut self, envelope: &Envelope, email: &[u8]) -> Result<(), MailerError> {
        let response = self
            .connection
            .send(envelope, email)
            .map_err(|err| MailerError::Transmission {
                transient: err.is_transient() || err.is_timeout(),
                reason: err.to_string(),
            })?;

        debug!(code = %response.code(), "message accepted");

        Ok(())
    }

    fn close(&mut self) {
        if let Err(err) = self.connection.quit() {
            warn!(address = %self.address, "could not close the connection cleanly: {err}");

            self.connection.abort();
        }
    }
}

#[cfg(test)]
pub mod tests {
    use std::{
        io::{Read, Write},
        net::TcpListener,
        thread,
    };

    use testresult::TestResult;

    use super::*;

    pub use super::{MockSmtpConnector, MockSmtpSession};

    #[test]
    fn test_connect_to_closed_port() -> TestResult {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        drop(listener);

        let connector = LettreConnector::new("127.0.0.1", port, Some(Duration::from_secs(5)), true);

        let result = connector.connect();

        assert!(matches!(
            result,
            Err(MailerError::Connect { ref address, .. }) if *address == format!("127.0.0.1:{port}")
        ));

        Ok(())
    }

    #[test]
    fn test_plaintext_server_fails_tls_handshake() -> TestResult {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();

        let server = thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let _ = stream.write_all(b"220 mail.example.com ESMTP ready\r\n");
                let _ = stream.read(&mut [0u8; 512]);
            }
        });

        let connector = LettreConnector::new("127.0.0.1", port, Some(Duration::from_secs(5)), true);

        let result = connector.connect();

        let err = result.err().ok_or("connected to a plaintext server")?;

        assert!(matches!(err, MailerError::Tls { ref host, .. } if host == "127.0.0.1"));
        assert!(!err.is_retryable());

        let _ = server.join();

        Ok(())
    }

    #[test]
    fn test_io_error_is_not_a_tls_failure() {
        let err = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");

        assert!(!is_tls_failure(&err));
    }

    #[test]
    fn test_temporary_lookup_failure() {
        let temporary = io::Error::new(
            io::ErrorKind::Other,
            "failed to lookup address information: Temporary failure in name resolution",
        );
        let unknown_host = io::Error::new(
            io::ErrorKind::Other,
            "failed to lookup address information: Name or service not known",
        );

        assert!(is_temporary_lookup_failure(&temporary));
        assert!(!is_temporary_lookup_failure(&unknown_host));
        assert!(is_temporary_lookup_failure(&io::Error::from(
            io::ErrorKind::TimedOut
        )));
    }

    #[test]
    fn test_host_is_trimmed() {
        let connector = LettreConnector::new(" smtp.example.com ", 465, None, true);

        assert_eq!(connector.address(), "smtp.example.com:465");
    }
}
