use axum::{RequestPartsExt, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::debug;

use super::token::AdminClaims;
use crate::{error::AppError, router::AppState};

/// Extractor guarding admin endpoints. Requires `Authorization: Bearer <token>`
/// carrying a valid, unexpired token with `admin: true`.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub claims: AdminClaims,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Unauthorized("No token provided"))?;

        let claims = state.tokens.verify(bearer.token()).map_err(|e| {
            debug!("Rejected admin token: {e}");
            AppError::Unauthorized("Invalid or expired token")
        })?;

        if !claims.admin {
            return Err(AppError::Unauthorized("Invalid token"));
        }

        Ok(Self { claims })
    }
}
