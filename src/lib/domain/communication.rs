//! Communication module

pub mod delivery;
pub mod email_addresses;
pub mod mailer;
pub mod passwords;
