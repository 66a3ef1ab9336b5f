use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::auth::jwt::{encode_token, Claims};
use crate::auth::{AuthUser, SESSION_COOKIE};
use crate::error::AppError;
use crate::models::User;
use crate::services::{accounts, deliveries};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetTokenQuery {
    #[serde(default)]
    pub token: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_string(),
        })
    }
}

fn session_cookie(state: &SharedState, token: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(state.config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(state.config.session_hours))
        .build()
}

fn cleared_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = accounts::register(
        state.store.as_ref(),
        accounts::Registration {
            full_name: req.full_name,
            email: req.email,
            password: req.password,
            confirm_password: req.confirm_password,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<SharedState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let user = accounts::authenticate(
        state.store.as_ref(),
        &state.login_limiter,
        &req.email,
        &req.password,
    )
    .await?;

    let claims = Claims::new(
        user.id,
        &user.email,
        Duration::hours(state.config.session_hours),
    );
    let token = encode_token(&claims, &state.config.jwt_secret).map_err(AppError::Internal)?;

    if state.config.seed_demo {
        let ctx = AuthUser {
            user_id: user.id,
            email: user.email.clone(),
        };
        let seeded =
            deliveries::seed_demo_if_empty(state.store.as_ref(), state.clock.as_ref(), &ctx).await;
        if let Err(e) = seeded {
            tracing::error!(user_id = %user.id, "Failed to seed demo deliveries: {e}");
        }
    }

    tracing::info!(user_id = %user.id, "User logged in");

    let jar = jar.add(session_cookie(&state, &token));
    Ok((jar, Json(LoginResponse { token, user })))
}

pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.add(cleared_session_cookie()),
        MessageResponse::new("You have been logged out."),
    )
}

pub async fn me(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<User>, AppError> {
    let user = state
        .store
        .find_user_by_id(auth.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Please log in to continue.".to_string()))?;
    Ok(Json(user))
}

pub async fn change_password(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    accounts::change_password(
        state.store.as_ref(),
        &auth,
        &req.current_password,
        &req.new_password,
        &req.confirm_password,
    )
    .await?;

    Ok(MessageResponse::new("Your password has been updated."))
}

pub async fn forgot_password(
    State(state): State<SharedState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Json<MessageResponse> {
    accounts::request_password_reset(
        state.store.as_ref(),
        state.clock.as_ref(),
        state.notifier.as_ref(),
        &state.reset_limiter,
        &state.config.base_url,
        &req.email,
    )
    .await;

    // Same answer whether or not the email exists
    MessageResponse::new(accounts::RESET_REQUESTED_MESSAGE)
}

pub async fn check_reset_token(
    State(state): State<SharedState>,
    Query(query): Query<ResetTokenQuery>,
) -> Result<Json<MessageResponse>, AppError> {
    accounts::lookup_reset_token(state.store.as_ref(), state.clock.as_ref(), &query.token)
        .await?;
    Ok(MessageResponse::new("Reset token is valid."))
}

pub async fn reset_password(
    State(state): State<SharedState>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    accounts::redeem_password_reset(
        state.store.as_ref(),
        state.clock.as_ref(),
        &req.token,
        &req.password,
        &req.confirm_password,
    )
    .await?;

    Ok(MessageResponse::new(
        "Your password has been reset. Please log in.",
    ))
}
