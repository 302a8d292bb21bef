//! API handlers for the Communal Library REST endpoints

pub mod books;
pub mod health;
pub mod loans;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::user::{Claims, Role, User},
    AppState,
};

/// Response envelope: every endpoint returns at least a `msg` field,
/// successful payloads attach their data alongside it.
#[derive(Serialize, ToSchema)]
pub struct MsgResponse {
    pub msg: String,
}

/// Extractor for the authenticated principal, derived from a verified
/// access token. Handlers receive the claims as an explicit value.
pub struct AuthenticatedUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Get the Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        // Check for Bearer token
        if !auth_header.starts_with("Bearer ") {
            return Err(AppError::Authentication(
                "Invalid authorization header format".to_string(),
            ));
        }

        let token = &auth_header[7..];
        let claims = state.services.tokens.verify_access_token(token)?;

        Ok(AuthenticatedUser(claims))
    }
}

/// Extractor gating admin-only routes. Verifies the bearer token, then
/// re-fetches the user record and requires the admin role; no mutation.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(claims) = AuthenticatedUser::from_request_parts(parts, state).await?;

        let user = state.services.users.get_by_id(claims.sub).await?;
        if user.role != Role::Admin {
            return Err(AppError::Authorization(
                "You are not allowed to perform this action".to_string(),
            ));
        }

        Ok(AdminUser(user))
    }
}
