#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    missing_docs,
    rustdoc::broken_intra_doc_links,
    rustdoc::missing_crate_level_docs
)]

//! Sends one plain text email over implicit-TLS SMTP

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use smtps_mailer::{
    domain::communication::{
        delivery::{deliver, failure_notice},
        email_addresses::EmailAddress,
        mailer::MailerError,
    },
    infrastructure::email::smtp::{format_message, SMTPConfig, SMTPMailer},
};
use tracing_subscriber::EnvFilter;

/// The message to send
#[derive(Debug, Parser)]
pub struct MessageArgs {
    /// The recipient's email address
    #[arg(long, env = "MAIL_RECIPIENT")]
    pub to: EmailAddress,

    /// The subject line
    #[arg(long, env = "MAIL_SUBJECT")]
    pub subject: String,

    /// The plain text body
    #[arg(long, env = "MAIL_BODY")]
    pub body: String,
}

/// Command-line arguments / environment variables
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Args {
    /// The SMTP server configuration
    #[clap(flatten)]
    pub smtp: SMTPConfig,

    /// The message
    #[clap(flatten)]
    pub message: MessageArgs,

    /// Print the serialized message instead of sending it
    #[arg(long, env = "MAIL_DRY_RUN", conflicts_with = "verify_only")]
    pub dry_run: bool,

    /// Connect and log in, then disconnect without sending
    #[arg(long, env = "MAIL_VERIFY_ONLY")]
    pub verify_only: bool,
}

#[mutants::skip]
fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<MailerError>() {
                Some(err) => eprintln!("{}", failure_notice(err)),
                None => eprintln!("Error: {e}"),
            }

            ExitCode::FAILURE
        }
    }
}

#[mutants::skip]
fn run() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mailer = SMTPMailer::new(args.smtp)?;

    if args.dry_run {
        let message = mailer.message(&args.message.to, &args.message.subject, &args.message.body);
        let email = format_message(&message)?;

        println!("{}", String::from_utf8_lossy(&email.formatted()));

        return Ok(());
    }

    if args.verify_only {
        mailer.verify()?;
        println!("Connection verified successfully!");

        return Ok(());
    }

    deliver(
        &mailer,
        &args.message.to,
        &args.message.subject,
        &args.message.body,
    )?;

    println!("Email sent successfully!");

    Ok(())
}
