//! Delivery of a single email through a [`Mailer`]

use tracing::{debug, info};

use crate::domain::communication::{
    email_addresses::EmailAddress,
    mailer::{Mailer, MailerError},
};

/// Sends one email and reports the outcome.
///
/// Failures are only traced at debug level and handed back; reporting them
/// to the operator is the caller's job. Nothing is retried here.
pub fn deliver<M: Mailer>(
    mailer: &M,
    to: &EmailAddress,
    subject: &str,
    body: &str,
) -> Result<(), MailerError> {
    match mailer.send_email(to, subject, body) {
        Ok(()) => {
            info!(recipient = %to, "email sent");

            Ok(())
        }
        Err(err) => {
            debug!(
                recipient = %to,
                retryable = err.is_retryable(),
                "email could not be sent: {err}"
            );

            Err(err)
        }
    }
}

/// The single line shown to the operator when delivery fails
pub fn failure_notice(err: &MailerError) -> String {
    if err.is_retryable() {
        format!("Error: {err} (temporary, trying again later may succeed)")
    } else {
        format!("Error: {err}")
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::domain::communication::mailer::tests::MockMailer;

    use super::*;

    #[test]
    fn test_deliver_success() -> TestResult {
        let to = EmailAddress::new("john@example.com")?;
        let expected = to.clone();

        let mut mailer = MockMailer::new();

        mailer
            .expect_send_email()
            .times(1)
            .withf(move |to, subject, body| {
                *to == expected && subject == "Hello" && body == "Hi John"
            })
            .returning(|_, _, _| Ok(()));

        deliver(&mailer, &to, "Hello", "Hi John")?;

        Ok(())
    }

    #[test]
    fn test_deliver_failure_is_returned_unchanged() -> TestResult {
        let to = EmailAddress::new("john@example.com")?;

        let mut mailer = MockMailer::new();

        mailer.expect_send_email().times(1).returning(|_, _, _| {
            Err(MailerError::Connect {
                address: "smtp.example.com:465".to_string(),
                reason: "connection refused".to_string(),
            })
        });

        let result = deliver(&mailer, &to, "Hello", "Hi John");

        assert_eq!(
            result,
            Err(MailerError::Connect {
                address: "smtp.example.com:465".to_string(),
                reason: "connection refused".to_string(),
            })
        );

        Ok(())
    }

    #[test]
    fn test_failure_notice_is_one_line() {
        let notice = failure_notice(&MailerError::Authentication {
            username: "jane@example.com".to_string(),
            reason: "535 5.7.8 authentication failed".to_string(),
        });

        assert_eq!(
            notice,
            "Error: authentication as jane@example.com failed: 535 5.7.8 authentication failed"
        );
        assert!(!notice.contains('\n'));
    }

    #[test]
    fn test_failure_notice_marks_retryable_errors() {
        let notice = failure_notice(&MailerError::Connect {
            address: "smtp.example.com:465".to_string(),
            reason: "connection refused".to_string(),
        });

        assert_eq!(
            notice,
            "Error: could not connect to smtp.example.com:465: connection refused \
             (temporary, trying again later may succeed)"
        );
    }
}
