use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::{admin::AdminSession, token::AdminClaims};
use crate::{error::AppError, extract::AppJson, router::AppState};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    password: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/login", post(self::post::login))
        .route("/api/admin/verify", get(self::get::verify))
}

mod post {
    use super::*;

    pub async fn login(
        State(state): State<AppState>,
        AppJson(LoginRequest { password }): AppJson<LoginRequest>,
    ) -> Result<Json<Value>, AppError> {
        let Some(password) = password.filter(|p| !p.is_empty()) else {
            return Err(AppError::validation("Password is required"));
        };

        if !state
            .tokens
            .password_matches(&password, &state.config.admin_password)
        {
            warn!("Admin login rejected");
            return Err(AppError::Unauthorized("Invalid password"));
        }

        let token = state
            .tokens
            .sign(&AdminClaims::new_admin())
            .map_err(|e| AppError::Internal(format!("Failed to sign admin token: {e}")))?;
        info!("Admin logged in");

        Ok(Json(json!({
            "success": true,
            "token": token,
            "message": "Login successful",
        })))
    }
}

mod get {
    use super::*;

    pub async fn verify(AdminSession { claims }: AdminSession) -> Json<Value> {
        Json(json!({
            "success": true,
            "valid": true,
            "expiresAt": claims.exp,
        }))
    }
}
