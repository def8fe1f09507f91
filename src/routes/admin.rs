use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use super::NumberOrText;
use crate::{
    auth::admin::AdminSession,
    error::AppError,
    extract::{AppJson, AppPath},
    router::AppState,
    services::{
        links::{self, NewLink},
        rsvps::{self, RsvpDraft},
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/rsvps", get(list_rsvps))
        .route("/api/admin/rsvps/{id}", put(edit_rsvp).delete(delete_rsvp))
        .route(
            "/api/admin/rsvps/{id}/toggle-visibility",
            post(toggle_visibility),
        )
        .route("/api/admin/cleanup-test-data", delete(cleanup_test_data))
        .route("/api/admin/create-link-identifier", post(create_link))
        .route("/api/admin/check-link-identifier", post(check_link))
        .route(
            "/api/admin/get-unused-link-identifiers",
            get(unused_links),
        )
        .route(
            "/api/admin/link-identifiers/{identifier}/flags",
            post(update_link_flags),
        )
        .route("/api/admin/generate-link-identifiers", post(generate_links))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    include_hidden: Option<String>,
}

async fn list_rsvps(
    _admin: AdminSession,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>, AppError> {
    let listing = rsvps::listing(&state.db).await?;

    if query.include_hidden.as_deref() == Some("true") {
        return Ok(Json(json!({
            "rsvps": listing.hidden,
            "type": "hidden",
        })));
    }

    Ok(Json(json!({
        "rsvps": listing.production,
        "testRsvps": listing.test,
        "type": "regular",
    })))
}

/// Admin edits use the stored column names.
#[derive(Debug, Deserialize)]
pub struct EditRequest {
    full_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    company: Option<String>,
    attending: Option<String>,
    has_guests: Option<String>,
    guest_count: Option<NumberOrText>,
    donation: Option<String>,
}

async fn edit_rsvp(
    _admin: AdminSession,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(req): AppJson<EditRequest>,
) -> Result<Json<Value>, AppError> {
    let draft = RsvpDraft {
        full_name: req.full_name,
        email: req.email,
        phone: req.phone,
        company: req.company,
        attending: req.attending,
        has_guests: req.has_guests,
        guest_count: NumberOrText::parse("guest_count", req.guest_count)?,
        donation: req.donation,
    };
    rsvps::edit(&state.db, id, draft).await?;

    Ok(Json(json!({
        "success": true,
        "message": "RSVP updated successfully",
    })))
}

async fn delete_rsvp(
    admin: AdminSession,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
) -> Result<Json<Value>, AppError> {
    rsvps::delete(&state.db, id).await?;
    info!("RSVP {id} deleted by admin session issued at {}", admin.claims.iat);

    Ok(Json(json!({
        "success": true,
        "message": "RSVP deleted successfully",
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityRequest {
    is_hidden: Option<Value>,
}

async fn toggle_visibility(
    _admin: AdminSession,
    State(state): State<AppState>,
    AppPath(id): AppPath<i32>,
    AppJson(req): AppJson<VisibilityRequest>,
) -> Result<Json<Value>, AppError> {
    let Some(is_hidden) = req.is_hidden.as_ref().and_then(Value::as_bool) else {
        return Err(AppError::validation("isHidden must be a boolean"));
    };

    rsvps::set_hidden(&state.db, id, is_hidden).await?;
    let verb = if is_hidden { "hidden" } else { "shown" };

    Ok(Json(json!({
        "success": true,
        "message": format!("RSVP {verb} successfully"),
    })))
}

async fn cleanup_test_data(
    admin: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let report = rsvps::cleanup_test_data(&state.db).await?;
    info!(
        "Test data cleaned up by admin session issued at {}",
        admin.claims.iat
    );

    Ok(Json(json!({
        "success": true,
        "message": format!(
            "Successfully cleaned up test data: {} RSVPs and {} link identifiers deleted",
            report.rsvps_deleted, report.links_deleted
        ),
        "rsvpsDeleted": report.rsvps_deleted,
        "linksDeleted": report.links_deleted,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    link_identifier: Option<String>,
    #[serde(default)]
    is_vip: bool,
    #[serde(default)]
    is_hidden: bool,
}

async fn create_link(
    _admin: AdminSession,
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateLinkRequest>,
) -> Result<Json<Value>, AppError> {
    let link = links::create(
        &state.db,
        NewLink {
            identifier: req.link_identifier.unwrap_or_default(),
            is_vip: req.is_vip,
            is_hidden: req.is_hidden,
        },
    )
    .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Link identifier created successfully",
        "linkId": link.id,
        "linkIdentifier": link.uuid,
        "trackingNumber": link.tracking_number,
        "isVip": link.is_vip,
        "isHidden": link.is_hidden,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckLinkRequest {
    link_identifier: Option<String>,
}

async fn check_link(
    _admin: AdminSession,
    State(state): State<AppState>,
    AppJson(req): AppJson<CheckLinkRequest>,
) -> Result<Json<Value>, AppError> {
    let Some(identifier) = req.link_identifier.filter(|i| !i.trim().is_empty()) else {
        return Err(AppError::validation("Link identifier is required"));
    };

    let link = links::find_by_identifier(&state.db, identifier.trim()).await?;
    Ok(Json(json!({
        "exists": link.is_some(),
        "linkData": link,
    })))
}

async fn unused_links(
    _admin: AdminSession,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let unused = links::unused(&state.db).await?;

    Ok(Json(json!({
        "success": true,
        "linkIdentifiers": unused,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagsRequest {
    is_vip: Option<bool>,
    is_hidden: Option<bool>,
}

async fn update_link_flags(
    _admin: AdminSession,
    State(state): State<AppState>,
    AppPath(identifier): AppPath<String>,
    AppJson(req): AppJson<FlagsRequest>,
) -> Result<Json<Value>, AppError> {
    let link = links::update_flags(&state.db, &identifier, req.is_vip, req.is_hidden).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Link identifier updated successfully",
        "linkData": link,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    count: Option<u32>,
    #[serde(default)]
    is_vip: bool,
    #[serde(default)]
    is_hidden: bool,
    #[serde(default)]
    test: bool,
}

async fn generate_links(
    admin: AdminSession,
    State(state): State<AppState>,
    AppJson(req): AppJson<GenerateRequest>,
) -> Result<Json<Value>, AppError> {
    let Some(count) = req.count else {
        return Err(AppError::validation("Count is required"));
    };

    let generated = links::generate(&state.db, count, req.is_vip, req.is_hidden, req.test).await?;
    info!(
        "Admin session issued at {} generated {} link identifiers",
        admin.claims.iat,
        generated.len()
    );

    Ok(Json(json!({
        "success": true,
        "message": format!("Generated {} link identifiers", generated.len()),
        "linkIdentifiers": generated,
    })))
}
