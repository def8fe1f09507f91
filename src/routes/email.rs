use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    routing::post,
};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::NumberOrText;
use crate::{
    auth::admin::AdminSession,
    error::AppError,
    extract::AppJson,
    mail::{Attachment, BulkReport, EmailKind, Message, Recipient, RsvpSummary},
    router::AppState,
    services::{
        links::{self, NewLink},
        rsvps,
    },
};

/// Upper bound for a bulk send request, attachments included.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Unreserved URL characters stay as they are in invite links.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/send-email", post(send_email))
        .route(
            "/api/admin/send-general-email",
            post(send_general_email).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
}

pub fn invite_url(site_url: &str, identifier: &str) -> String {
    format!(
        "{}/{}",
        site_url.trim_end_matches('/'),
        utf8_percent_encode(identifier, PATH_SEGMENT)
    )
}

/// Invite links are inserted into emails unescaped, so only plain http(s)
/// URLs are accepted from the form.
fn is_plain_http_url(url: &str) -> bool {
    (url.starts_with("https://") || url.starts_with("http://"))
        && !url
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\'' | '<' | '>' | '&'))
}

fn custom_message(subject: Option<String>, body: Option<String>) -> Result<Message, AppError> {
    match (
        subject.filter(|s| !s.trim().is_empty()),
        body.filter(|b| !b.trim().is_empty()),
    ) {
        (Some(subject), Some(body)) => Ok(Message::Custom { subject, body }),
        _ => Err(AppError::validation(
            "Custom subject and message are required for custom emails",
        )),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    rsvp_id: Option<NumberOrText>,
    email_type: Option<String>,
    custom_subject: Option<String>,
    custom_message: Option<String>,
}

/// Sends one email to a stored RSVP. A provider failure fails the request.
async fn send_email(
    _admin: AdminSession,
    State(state): State<AppState>,
    AppJson(req): AppJson<SendEmailRequest>,
) -> Result<Json<Value>, AppError> {
    let (Some(rsvp_id), Some(email_type)) = (
        NumberOrText::parse("rsvpId", req.rsvp_id)?,
        req.email_type.filter(|t| !t.is_empty()),
    ) else {
        return Err(AppError::validation(
            "RSVP ID and email type are required",
        ));
    };

    let message = match email_type.parse::<EmailKind>() {
        Ok(EmailKind::Confirmation) => Message::Confirmation,
        Ok(EmailKind::Reminder) => Message::Reminder,
        Ok(EmailKind::Custom) => custom_message(req.custom_subject, req.custom_message)?,
        _ => return Err(AppError::validation("Invalid email type")),
    };

    let id = i32::try_from(rsvp_id).map_err(|_| AppError::NotFound("RSVP not found"))?;
    let rsvp = rsvps::find_view(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("RSVP not found"))?;

    state
        .notifier
        .send(&rsvp.email, &message, &RsvpSummary::from(&rsvp), &[])
        .await?;

    let kind = message.kind().as_str();
    let mut title = kind.to_string();
    title[..1].make_ascii_uppercase();

    Ok(Json(json!({
        "success": true,
        "message": format!("{title} email sent successfully to {}", rsvp.email),
    })))
}

/// Text fields and files of a bulk send form.
#[derive(Debug, Default)]
struct BulkForm {
    fields: HashMap<String, String>,
    attachments: Vec<Attachment>,
}

impl BulkForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = BulkForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "attachments" {
                let filename = field.file_name().unwrap_or("attachment").to_string();
                let content = field.bytes().await?;
                if !content.is_empty() {
                    debug!("Attachment {filename} ({} bytes)", content.len());
                    form.attachments.push(Attachment {
                        filename,
                        content: content.to_vec(),
                    });
                }
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn flag(&self, name: &str) -> bool {
        self.text(name).as_deref() == Some("true")
    }
}

fn parse_recipients(raw: &str) -> Result<Vec<Recipient>, AppError> {
    let recipients: Vec<Recipient> = serde_json::from_str(raw)
        .map_err(|_| AppError::validation("Invalid recipients format"))?;

    if recipients.is_empty() {
        return Err(AppError::validation("Recipients must be a non-empty array"));
    }
    if recipients
        .iter()
        .any(|r| r.email.trim().is_empty() || r.full_name.trim().is_empty())
    {
        return Err(AppError::validation(
            "Each recipient must have email and fullName",
        ));
    }

    Ok(recipients)
}

/// Sends one kind of email to an ad-hoc recipient list, one at a time.
async fn send_general_email(
    _admin: AdminSession,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let form = BulkForm::read(multipart).await?;

    let (Some(email_type), Some(raw_recipients)) = (form.text("emailType"), form.text("recipients"))
    else {
        return Err(AppError::validation(
            "Email type and recipients are required",
        ));
    };
    let recipients = parse_recipients(&raw_recipients)?;
    let kind = email_type
        .parse::<EmailKind>()
        .map_err(|_| AppError::validation("Invalid email type"))?;

    let mut is_vip = form.flag("isVip");
    let mut link_identifier = None;

    let message = match kind {
        EmailKind::Confirmation => Message::Confirmation,
        EmailKind::Reminder => Message::Reminder,
        EmailKind::Internal => Message::Internal { is_update: None },
        EmailKind::Custom => {
            custom_message(form.text("customSubject"), form.text("customMessage"))?
        }
        EmailKind::Invite => {
            let Some(identifier) = form.text("linkIdentifier") else {
                return Err(AppError::validation(
                    "Link identifier is required for invite emails",
                ));
            };

            let site_url = match form.text("siteUrl") {
                Some(url) if is_plain_http_url(&url) => url,
                Some(_) => return Err(AppError::validation("Invalid site URL")),
                None => state.config.site_url.clone(),
            };

            if form.flag("useExistingLink") {
                let link = links::find_by_identifier(&state.db, &identifier)
                    .await?
                    .ok_or(AppError::NotFound("Link identifier not found"))?;
                is_vip = link.is_vip;
            } else {
                links::create(
                    &state.db,
                    NewLink {
                        identifier: identifier.clone(),
                        is_vip,
                        is_hidden: form.flag("isHidden"),
                    },
                )
                .await?;
            }

            let url = invite_url(&site_url, &identifier);
            link_identifier = Some(identifier);
            Message::Invite { url, is_vip }
        }
    };

    let BulkReport {
        success_count,
        failure_count,
        errors,
    } = state
        .notifier
        .send_bulk(
            &message,
            &recipients,
            is_vip,
            link_identifier.as_deref(),
            &form.attachments,
        )
        .await;

    info!(
        "Bulk {} email: {success_count} sent, {failure_count} failed",
        kind.as_str()
    );

    let mut body = json!({
        "success": true,
        "message": format!(
            "Email sending completed. {success_count} successful, {failure_count} failed."
        ),
        "successCount": success_count,
        "failureCount": failure_count,
    });
    if !errors.is_empty() {
        body["errors"] = json!(errors);
    }

    Ok(Json(body))
}
