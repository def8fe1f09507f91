//! Transactional email: rendering, provider clients and dispatch.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

pub mod notify;
pub mod resend;
pub mod templates;

pub use notify::{BulkReport, Notifier, Recipient};
pub use templates::{EmailKind, EmailRenderer, Message, RsvpSummary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("Provider rejected email (status={status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Mailer unavailable: {0}")]
    Unavailable(String),
}

/// Hands a rendered email to a delivery provider. One attempt, no retries.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}

/// Used when no provider is configured: emails are logged, never delivered.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        info!(
            to = ?email.to,
            subject = %email.subject,
            attachments = email.attachments.len(),
            "Email delivery disabled, logging instead"
        );
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Keeps every email it is handed. Fails for any address in `failing`.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<Email>>,
        pub failing: Vec<String>,
    }

    impl RecordingMailer {
        pub fn failing_for(addresses: &[&str]) -> Self {
            Self {
                failing: addresses.iter().map(|a| a.to_string()).collect(),
                ..Default::default()
            }
        }

        pub fn sent(&self) -> Vec<Email> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: &Email) -> Result<(), MailError> {
            if email.to.iter().any(|to| self.failing.contains(to)) {
                return Err(MailError::Unavailable(format!("refused {:?}", email.to)));
            }
            self.sent.lock().unwrap().push(email.clone());
            Ok(())
        }
    }
}
