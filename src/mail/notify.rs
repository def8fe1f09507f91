use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::{
    Attachment, Email, Mailer,
    templates::{EmailRenderer, Message, RsvpSummary},
};
use crate::error::AppError;

/// A bulk-send recipient as supplied by the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipient {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReport {
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<String>,
}

/// Renders and sends every email the service produces.
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    renderer: EmailRenderer,
    from: String,
    internal_recipient: Option<String>,
}

impl Notifier {
    pub fn new(
        mailer: Arc<dyn Mailer>,
        renderer: EmailRenderer,
        from: String,
        internal_recipient: Option<String>,
    ) -> Self {
        Self {
            mailer,
            renderer,
            from,
            internal_recipient,
        }
    }

    pub async fn send(
        &self,
        to: &str,
        message: &Message,
        summary: &RsvpSummary,
        attachments: &[Attachment],
    ) -> Result<(), AppError> {
        let rendered = self.renderer.render(message, summary)?;
        let email = Email {
            from: self.from.clone(),
            to: vec![to.to_string()],
            subject: rendered.subject,
            html: rendered.html,
            attachments: attachments.to_vec(),
        };

        self.mailer.send(&email).await?;
        info!("{} email sent to {to}", message.kind().as_str());
        Ok(())
    }

    /// Follow-up for a stored submission: a confirmation to the invitee and,
    /// for attendees, a notice to the internal inbox. Failures are logged only.
    pub async fn rsvp_submitted(&self, summary: &RsvpSummary, is_update: bool) {
        if let Err(e) = self
            .send(&summary.email, &Message::Confirmation, summary, &[])
            .await
        {
            error!("Error sending confirmation email to {}: {e}", summary.email);
        }

        if !summary.attending.is_yes() {
            return;
        }

        let Some(internal) = &self.internal_recipient else {
            warn!("INTERNAL_NOTIFICATION_EMAIL not set, skipping internal notification");
            return;
        };

        let notice = Message::Internal {
            is_update: Some(is_update),
        };
        if let Err(e) = self.send(internal, &notice, summary, &[]).await {
            error!("Error sending internal notification: {e}");
        }
    }

    /// Sends `message` to each recipient in turn. One failure does not stop
    /// the batch.
    pub async fn send_bulk(
        &self,
        message: &Message,
        recipients: &[Recipient],
        is_vip: bool,
        link_identifier: Option<&str>,
        attachments: &[Attachment],
    ) -> BulkReport {
        let mut report = BulkReport::default();

        for recipient in recipients {
            let summary = RsvpSummary {
                is_vip,
                link_identifier: link_identifier.map(str::to_string),
                ..RsvpSummary::for_recipient(
                    recipient.full_name.clone(),
                    recipient.email.clone(),
                    recipient.phone.clone(),
                    recipient.company.clone(),
                )
            };

            match self
                .send(&recipient.email, message, &summary, attachments)
                .await
            {
                Ok(()) => report.success_count += 1,
                Err(e) => {
                    error!("Error sending email to {}: {e}", recipient.email);
                    report
                        .errors
                        .push(format!("Failed to send email to {}", recipient.email));
                    report.failure_count += 1;
                }
            }
        }

        report
    }
}
