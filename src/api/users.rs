//! User account endpoints

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderName, StatusCode},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::user::{LoginUser, RegisterUser, UpdateProfile, UserProfile},
};

use super::{AuthenticatedUser, MsgResponse};

/// Profile response
#[derive(Serialize, ToSchema)]
pub struct ProfileResponse {
    pub msg: String,
    pub user: UserProfile,
}

/// Build the refresh-token cookie for a user. The cookie is keyed by the
/// user's email and carries the configured security flags.
fn refresh_cookie(auth: &AuthConfig, email: &str, token: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(format!("{}_key", email), token);
    cookie.set_path("/");
    cookie.set_http_only(auth.cookie_http_only);
    cookie.set_secure(auth.cookie_secure);
    cookie.set_max_age(time::Duration::days(auth.refresh_expiry_days));
    cookie
}

/// Register a new member account
#[utoipa::path(
    post,
    path = "/users/register",
    tag = "users",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "Registration completed", body = MsgResponse),
        (status = 409, description = "Email is already used"),
        (status = 422, description = "Validation failure")
    )
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(payload): Json<RegisterUser>,
) -> AppResult<(StatusCode, Json<MsgResponse>)> {
    payload.validate()?;

    let user = state.services.users.register(payload).await?;

    // Welcome notification after the account is persisted; a delivery
    // failure never rolls the registration back.
    let email_service = state.services.email.clone();
    let (to, name) = (user.email.clone(), user.name.clone());
    tokio::spawn(async move {
        if let Err(e) = email_service.send_welcome(&to, &name).await {
            tracing::warn!("Welcome notification to {} failed: {}", to, e);
        }
    });

    Ok((
        StatusCode::CREATED,
        Json(MsgResponse {
            msg: "registration completed".to_string(),
        }),
    ))
}

/// Log in with email and password.
///
/// The access token is returned in the `Authorization` response header and
/// the refresh token in an HTTP-only cookie named `<email>_key`.
#[utoipa::path(
    post,
    path = "/users/login",
    tag = "users",
    request_body = LoginUser,
    responses(
        (status = 200, description = "User connected", body = MsgResponse),
        (status = 401, description = "Incorrect password"),
        (status = 404, description = "No account with this email"),
        (status = 422, description = "Validation failure")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginUser>,
) -> AppResult<(CookieJar, [(HeaderName, String); 1], Json<MsgResponse>)> {
    payload.validate()?;

    let user = state
        .services
        .users
        .authenticate(&payload.email, &payload.password)
        .await?;

    let access = state.services.tokens.sign_access_token(&user)?;
    let refresh = state.services.tokens.sign_refresh_token(&user)?;

    let jar = jar.add(refresh_cookie(&state.config.auth, &user.email, refresh));

    Ok((
        jar,
        [(AUTHORIZATION, format!("Bearer {}", access))],
        Json(MsgResponse {
            msg: "user connected".to_string(),
        }),
    ))
}

/// Log out: clear the authorization header and the refresh cookie.
///
/// The access token is not invalidated server-side; it expires naturally.
#[utoipa::path(
    post,
    path = "/users/logout",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User disconnected", body = MsgResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn logout(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    jar: CookieJar,
) -> AppResult<(CookieJar, [(HeaderName, String); 1], Json<MsgResponse>)> {
    let user = state.services.users.get_by_id(claims.sub).await?;

    let mut cookie = Cookie::new(format!("{}_key", user.email), "");
    cookie.set_path("/");
    let jar = jar.remove(cookie);

    let email_service = state.services.email.clone();
    let (to, name) = (user.email.clone(), user.name.clone());
    tokio::spawn(async move {
        if let Err(e) = email_service.send_logout_notice(&to, &name).await {
            tracing::warn!("Logout notification to {} failed: {}", to, e);
        }
    });

    Ok((
        jar,
        [(AUTHORIZATION, "Bearer ".to_string())],
        Json(MsgResponse {
            msg: "user disconnected".to_string(),
        }),
    ))
}

/// Public profile of the authenticated user
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User profile", body = ProfileResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<ProfileResponse>> {
    let user = state.services.users.get_by_id(claims.sub).await?;

    Ok(Json(ProfileResponse {
        msg: "user profile".to_string(),
        user: UserProfile::from(&user),
    }))
}

/// Update the authenticated user's profile.
/// The password is re-hashed only when a new one is supplied.
#[utoipa::path(
    put,
    path = "/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = UpdateProfile,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 401, description = "Not authenticated"),
        (status = 409, description = "Email is already used"),
        (status = 422, description = "Validation failure")
    )
)]
pub async fn update_me(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(payload): Json<UpdateProfile>,
) -> AppResult<Json<ProfileResponse>> {
    payload.validate()?;

    let user = state.services.users.update_profile(claims.sub, payload).await?;

    Ok(Json(ProfileResponse {
        msg: format!("{} has been updated successfully", user.name),
        user: UserProfile::from(&user),
    }))
}

/// Delete the authenticated user's account
#[utoipa::path(
    delete,
    path = "/users/me",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Account deleted", body = MsgResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn delete_me(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<MsgResponse>> {
    let user = state.services.users.get_by_id(claims.sub).await?;
    state.services.users.delete(user.id).await?;

    Ok(Json(MsgResponse {
        msg: format!("{} has been deleted successfully", user.name),
    }))
}

/// Exchange the refresh-token cookie for a fresh token pair.
/// The new pair follows the same header/cookie contract as login.
#[utoipa::path(
    post,
    path = "/users/{id}/refresh",
    tag = "users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Token refreshed", body = MsgResponse),
        (status = 401, description = "Missing or invalid refresh token"),
        (status = 404, description = "User not found")
    )
)]
pub async fn refresh(
    State(state): State<crate::AppState>,
    Path(user_id): Path<Uuid>,
    jar: CookieJar,
) -> AppResult<(CookieJar, [(HeaderName, String); 1], Json<MsgResponse>)> {
    let user = state.services.users.get_by_id(user_id).await?;

    let cookie_name = format!("{}_key", user.email);
    let token = jar
        .get(&cookie_name)
        .map(|c| c.value().to_string())
        .ok_or_else(|| AppError::Authentication("Failed to fetch refresh token".to_string()))?;

    let claims = state.services.tokens.verify_refresh_token(&token)?;
    if claims.sub != user.id {
        return Err(AppError::Authentication(
            "Refresh token does not match this user".to_string(),
        ));
    }

    let access = state.services.tokens.sign_access_token(&user)?;
    let refresh = state.services.tokens.sign_refresh_token(&user)?;

    let jar = jar.add(refresh_cookie(&state.config.auth, &user.email, refresh));

    Ok((
        jar,
        [(AUTHORIZATION, format!("Bearer {}", access))],
        Json(MsgResponse {
            msg: "token refreshed".to_string(),
        }),
    ))
}
