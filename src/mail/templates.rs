use std::{str::FromStr, sync::Arc};

use minijinja::{Environment, Value, context};
use serde::{Deserialize, Serialize};

use crate::{config::EventDetails, entities::sea_orm_active_enums::Answer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailKind {
    Confirmation,
    Reminder,
    Custom,
    Invite,
    Internal,
}

impl EmailKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EmailKind::Confirmation => "confirmation",
            EmailKind::Reminder => "reminder",
            EmailKind::Custom => "custom",
            EmailKind::Invite => "invite",
            EmailKind::Internal => "internal",
        }
    }

    fn template(self) -> &'static str {
        match self {
            EmailKind::Confirmation => "emails/confirmation.html",
            EmailKind::Reminder => "emails/reminder.html",
            EmailKind::Custom => "emails/custom.html",
            EmailKind::Invite => "emails/invite.html",
            EmailKind::Internal => "emails/internal.html",
        }
    }
}

impl FromStr for EmailKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmation" => Ok(EmailKind::Confirmation),
            "reminder" => Ok(EmailKind::Reminder),
            "custom" => Ok(EmailKind::Custom),
            "invite" => Ok(EmailKind::Invite),
            "internal" => Ok(EmailKind::Internal),
            _ => Err(()),
        }
    }
}

/// What to say. Carries the per-kind inputs the templates need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Confirmation,
    Reminder,
    Custom { subject: String, body: String },
    Invite { url: String, is_vip: bool },
    /// `is_update` is set when the notice follows a form submission.
    Internal { is_update: Option<bool> },
}

impl Message {
    pub fn kind(&self) -> EmailKind {
        match self {
            Message::Confirmation => EmailKind::Confirmation,
            Message::Reminder => EmailKind::Reminder,
            Message::Custom { .. } => EmailKind::Custom,
            Message::Invite { .. } => EmailKind::Invite,
            Message::Internal { .. } => EmailKind::Internal,
        }
    }
}

/// The invitee facts an email may mention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RsvpSummary {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub attending: Answer,
    pub has_guests: Option<Answer>,
    pub guest_count: i32,
    pub donation: Option<Answer>,
    pub is_vip: bool,
    pub link_identifier: Option<String>,
}

impl RsvpSummary {
    /// Summary for someone who is not (yet) tied to a stored RSVP.
    pub fn for_recipient(
        full_name: impl Into<String>,
        email: impl Into<String>,
        phone: Option<String>,
        company: Option<String>,
    ) -> Self {
        Self {
            full_name: full_name.into(),
            email: email.into(),
            phone,
            company,
            attending: Answer::Yes,
            has_guests: None,
            guest_count: 0,
            donation: None,
            is_vip: false,
            link_identifier: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub subject: String,
    pub html: String,
}

#[derive(Clone)]
pub struct EmailRenderer {
    env: Arc<Environment<'static>>,
    event: EventDetails,
    site_url: String,
}

impl EmailRenderer {
    pub fn new(env: Arc<Environment<'static>>, event: EventDetails, site_url: String) -> Self {
        Self {
            env,
            event,
            site_url,
        }
    }

    pub fn subject(&self, message: &Message, summary: &RsvpSummary) -> String {
        let event = &self.event.name;
        match message {
            Message::Confirmation if summary.attending.is_yes() => {
                format!("RSVP Confirmation - {event}")
            }
            Message::Confirmation => format!("Thank you for your response - {event}"),
            Message::Reminder => format!("Event Reminder - {event}"),
            Message::Custom { subject, .. } => subject.clone(),
            Message::Invite { is_vip, .. } => format!(
                "You're Invited - {event}{}",
                if *is_vip { " (VIP)" } else { "" }
            ),
            Message::Internal {
                is_update: Some(is_update),
            } => format!(
                "{} {}RSVP Received - {event}",
                if *is_update { "Updated" } else { "New" },
                if summary.is_vip { "VIP " } else { "" }
            ),
            Message::Internal { is_update: None } => format!("Internal Notification - {event}"),
        }
    }

    pub fn render(
        &self,
        message: &Message,
        summary: &RsvpSummary,
    ) -> Result<Rendered, minijinja::Error> {
        let subject = self.subject(message, summary);
        let tmpl = self.env.get_template(message.kind().template())?;

        let (paragraphs, invite_url, is_vip, is_update) = match message {
            Message::Custom { body, .. } => (
                body.lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .collect::<Vec<_>>(),
                None,
                summary.is_vip,
                None,
            ),
            Message::Invite { url, is_vip } => (Vec::new(), Some(url.as_str()), *is_vip, None),
            Message::Internal { is_update } => (Vec::new(), None, summary.is_vip, *is_update),
            _ => (Vec::new(), None, summary.is_vip, None),
        };

        // Already percent-encoded; escaping would mangle the slashes.
        let invite_url = invite_url
            .map(|url| Value::from_safe_string(url.to_string()))
            .unwrap_or_default();

        let html = tmpl.render(context! {
            subject => &subject,
            rsvp => summary,
            event => &self.event,
            site_url => &self.site_url,
            paragraphs => paragraphs,
            invite_url => invite_url,
            is_vip => is_vip,
            is_update => is_update,
        })?;

        Ok(Rendered { subject, html })
    }
}
