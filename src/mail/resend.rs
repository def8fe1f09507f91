use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Serialize;
use tracing::debug;

use super::{Email, MailError, Mailer};

const RESEND_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Serialize)]
struct ResendAttachment<'a> {
    filename: &'a str,
    /// Base64 encoded file body.
    content: String,
}

#[derive(Debug, Serialize)]
struct ResendSendEmailBody<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<ResendAttachment<'a>>,
}

/// Resend (resend.com) HTTP API client.
#[derive(Debug, Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
}

impl ResendMailer {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let body = ResendSendEmailBody {
            from: &email.from,
            to: &email.to,
            subject: &email.subject,
            html: &email.html,
            attachments: email
                .attachments
                .iter()
                .map(|a| ResendAttachment {
                    filename: &a.filename,
                    content: STANDARD.encode(&a.content),
                })
                .collect(),
        };

        let resp = self
            .client
            .post(RESEND_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            debug!(to = ?email.to, "Resend accepted email");
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        Err(MailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
