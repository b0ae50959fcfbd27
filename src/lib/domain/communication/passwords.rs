//! Password

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Password error
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordError {
    /// Password is empty
    #[error("password is empty")]
    Empty,
}

/// The secret used to authenticate with the mail server
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    /// Create a new password
    pub fn new(raw: &str) -> Result<Self, PasswordError> {
        if raw.is_empty() {
            return Err(PasswordError::Empty);
        }

        Ok(Self(raw.to_string()))
    }

    /// Reveal the secret, for handing to the transport
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl FromStr for Password {
    type Err = PasswordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn test_password_display_obfuscates() -> TestResult {
        let password = Password::new("correcthorsebatterystaple")?;
        assert_eq!(format!("{}", password), "********");

        Ok(())
    }

    #[test]
    fn test_password_debug_obfuscates() -> TestResult {
        let password = Password::new("correcthorsebatterystaple")?;
        assert_eq!(format!("{:?}", password), "********");

        Ok(())
    }

    #[test]
    fn test_expose_password() -> TestResult {
        let password: Password = "correcthorsebatterystaple".parse()?;
        assert_eq!(password.expose(), "correcthorsebatterystaple");

        Ok(())
    }

    #[test]
    fn test_empty_password() {
        let result = Password::new("");
        assert!(matches!(result, Err(PasswordError::Empty)))
    }

    #[test]
    fn test_whitespace_is_kept() -> TestResult {
        let password = Password::new(" pass word ")?;
        assert_eq!(password.expose(), " pass word ");

        Ok(())
    }
}
