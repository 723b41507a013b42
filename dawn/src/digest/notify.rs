//! Digest delivery
//!
//! [`SmtpMailer`] sends the digest over SMTP with STARTTLS; [`StdoutNotifier`]
//! prints it instead, for previews.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::{debug, info};

use super::{BRAND_NAME, Digest};
use crate::config::{EmailConfig, EmailSecrets};

/// Errors that can occur while delivering a digest
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid address '{address}': {reason}")]
    Address { address: String, reason: String },

    #[error("Failed to build email: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Delivers a rendered digest somewhere
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, digest: &Digest) -> Result<(), NotifyError>;
}

/// Sends the digest by email
pub struct SmtpMailer {
    from: Mailbox,
    to: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    /// Create a mailer from configuration and resolved credentials
    pub fn from_config(config: &EmailConfig, secrets: &EmailSecrets) -> Result<Self, NotifyError> {
        debug!(smtp_host = %config.smtp_host, smtp_port = config.smtp_port, "SmtpMailer::from_config: called");
        let from = mailbox(&format!("\"{}\" <{}>", BRAND_NAME, secrets.user))?;
        let to = mailbox(config.to.as_deref().unwrap_or(&secrets.user))?;

        // App passwords are often pasted with the spaces Google shows them with
        let password = secrets.password.replace(' ', "");
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(secrets.user.clone(), password))
            .build();

        Ok(Self { from, to, transport })
    }

    /// Build the message without sending it
    pub fn message(&self, digest: &Digest) -> Result<Message, NotifyError> {
        Ok(Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(&digest.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(digest.body.clone())?)
    }
}

#[async_trait]
impl Notifier for SmtpMailer {
    async fn send(&self, digest: &Digest) -> Result<(), NotifyError> {
        debug!(subject = %digest.subject, "SmtpMailer::send: called");
        let message = self.message(digest)?;
        self.transport.send(message).await?;
        info!(to = %self.to, "Email sent successfully");
        Ok(())
    }
}

/// Prints the digest to stdout
#[derive(Debug, Default)]
pub struct StdoutNotifier;

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn send(&self, digest: &Digest) -> Result<(), NotifyError> {
        debug!("StdoutNotifier::send: called");
        println!("Subject: {}\n", digest.subject);
        println!("{}", digest.body);
        Ok(())
    }
}

fn mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|e: lettre::address::AddressError| NotifyError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}
