use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde::Deserialize;
use serde_json::json;
use tokio::spawn;
use tracing::info;

use super::NumberOrText;
use crate::{
    error::AppError,
    extract::AppJson,
    mail::RsvpSummary,
    router::AppState,
    services::{
        links,
        rsvps::{self, RsvpDraft},
    },
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    full_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    company: Option<String>,
    attending: Option<String>,
    has_guests: Option<String>,
    guest_count: Option<NumberOrText>,
    donation: Option<String>,
    link_identifier: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    identifier: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/rsvp", post(submit))
        .route("/api/rsvp/check", post(check))
        .route("/api/link-identifier/validate", post(validate))
}

async fn submit(
    State(state): State<AppState>,
    AppJson(req): AppJson<SubmitRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let draft = RsvpDraft {
        full_name: req.full_name,
        email: req.email,
        phone: req.phone,
        company: req.company,
        attending: req.attending,
        has_guests: req.has_guests,
        guest_count: NumberOrText::parse("guestCount", req.guest_count)?,
        donation: req.donation,
    };

    let outcome = rsvps::submit(&state.db, req.link_identifier.as_deref(), draft).await?;
    let is_update = outcome.is_update;

    let summary = RsvpSummary::from(&outcome.view());
    let notifier = state.notifier.clone();
    spawn(async move {
        notifier.rsvp_submitted(&summary, is_update).await;
    });

    let message = if is_update {
        "RSVP updated successfully"
    } else {
        "RSVP submitted successfully"
    };
    Ok(Json(json!({
        "success": true,
        "message": message,
        "isUpdate": is_update,
    })))
}

/// Latest RSVP for an email address. Kept for older clients; the form now
/// looks up by link.
async fn check(
    State(state): State<AppState>,
    AppJson(CheckRequest { email }): AppJson<CheckRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Some(email) = email.filter(|e| !e.trim().is_empty()) else {
        return Err(AppError::validation("Email is required"));
    };

    let rsvp = rsvps::find_by_email(&state.db, &email).await?;
    Ok(Json(json!({
        "exists": rsvp.is_some(),
        "rsvp": rsvp,
    })))
}

async fn validate(
    State(state): State<AppState>,
    AppJson(ValidateRequest { identifier }): AppJson<ValidateRequest>,
) -> Result<Response, AppError> {
    let Some(identifier) = identifier.filter(|i| !i.trim().is_empty()) else {
        return Err(AppError::validation("Identifier is required"));
    };

    match links::validate(&state.db, identifier.trim()).await? {
        Some(link) => Ok(Json(json!({ "valid": true, "linkData": link })).into_response()),
        None => {
            info!("Unknown link identifier: {identifier}");
            Ok((
                StatusCode::NOT_FOUND,
                Json(json!({ "valid": false, "error": "Invalid link identifier" })),
            )
                .into_response())
        }
    }
}
