//! Registration, credential checks and the password reset lifecycle.
//!
//! A reset token is 32 random bytes, hex-encoded. Only its SHA-256 digest is
//! stored. A token is redeemable while unused and before `expires_at`, and
//! redemption marks it used in the same store transaction that writes the new
//! password hash.

use chrono::{DateTime, Duration, Utc};
use sha2::{Digest, Sha256};

use crate::auth::{password, AuthUser};
use crate::clock::Clock;
use crate::email::ResetNotifier;
use crate::error::AppError;
use crate::models::{NewPasswordReset, NewUser, PasswordReset, ResetTokenError, User};
use crate::rate_limit::AttemptLimiter;
use crate::store::{Store, StoreError};
use crate::validation;

pub const RESET_TOKEN_TTL_HOURS: i64 = 1;
pub const RESET_REQUESTED_MESSAGE: &str =
    "If that email is registered, a reset link has been sent.";

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

pub async fn register(store: &dyn Store, input: Registration) -> Result<User, AppError> {
    let full_name = input.full_name.trim().to_string();
    let email = validation::normalize_email(&input.email);

    let errors = validation::validate_registration(
        &full_name,
        &email,
        &input.password,
        &input.confirm_password,
    );
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    if store.find_user_by_email(&email).await?.is_some() {
        return Err(duplicate_account());
    }

    let password_hash = password::hash(&input.password).map_err(AppError::Internal)?;

    let user = store
        .create_user(NewUser {
            email,
            full_name: (!full_name.is_empty()).then_some(full_name),
            password_hash,
        })
        .await
        .map_err(|e| match e {
            StoreError::UniqueViolation(_) => duplicate_account(),
            other => AppError::Store(other),
        })?;

    tracing::info!(user_id = %user.id, "User registered");
    Ok(user)
}

fn duplicate_account() -> AppError {
    AppError::Conflict("An account with this email already exists.".to_string())
}

/// Checks an email/password pair. Unknown emails and wrong passwords fail the same way.
pub async fn authenticate(
    store: &dyn Store,
    limiter: &AttemptLimiter,
    email: &str,
    password: &str,
) -> Result<User, AppError> {
    let email = validation::normalize_email(email);
    if email.is_empty() || password.is_empty() {
        return Err(AppError::validation("Please enter both email and password."));
    }

    if limiter.check(&email).is_err() {
        return Err(AppError::RateLimited(
            "Too many login attempts. Please try again later.".to_string(),
        ));
    }

    let invalid = || AppError::Unauthorized("Invalid email or password.".to_string());

    let Some(user) = store.find_user_by_email(&email).await? else {
        limiter.record(&email);
        return Err(invalid());
    };

    let valid = password::verify(password, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        limiter.record(&email);
        return Err(invalid());
    }

    limiter.reset(&email);
    Ok(user)
}

pub async fn change_password(
    store: &dyn Store,
    ctx: &AuthUser,
    current_password: &str,
    new_password: &str,
    confirm_password: &str,
) -> Result<(), AppError> {
    let user = store
        .find_user_by_id(ctx.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Please log in to continue.".to_string()))?;

    let valid =
        password::verify(current_password, &user.password_hash).map_err(AppError::Internal)?;
    if !valid {
        return Err(AppError::validation("Current password is incorrect."));
    }

    let errors = validation::validate_new_password(new_password, confirm_password);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    let password_hash = password::hash(new_password).map_err(AppError::Internal)?;
    store.update_password(user.id, &password_hash).await?;

    tracing::info!(user_id = %user.id, "Password changed");
    Ok(())
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Creates a reset token for `user`, valid for one hour from `clock.now()`.
pub async fn issue_password_reset(
    store: &dyn Store,
    clock: &dyn Clock,
    user: &User,
) -> Result<IssuedToken, StoreError> {
    let token = generate_token();
    let expires_at = clock.now() + Duration::hours(RESET_TOKEN_TTL_HOURS);

    store
        .create_password_reset(NewPasswordReset {
            user_id: user.id,
            token_hash: hash_token(&token),
            expires_at,
        })
        .await?;

    Ok(IssuedToken { token, expires_at })
}

pub fn reset_url(base_url: &str, token: &str) -> String {
    format!("{base_url}/reset-password?token={token}")
}

/// Handles a forgot-password request.
///
/// Never reports whether the email exists. Unknown emails, throttled requests
/// and internal failures look the same to the caller; failures are only logged.
pub async fn request_password_reset(
    store: &dyn Store,
    clock: &dyn Clock,
    notifier: &dyn ResetNotifier,
    limiter: &AttemptLimiter,
    base_url: &str,
    email: &str,
) {
    let email = validation::normalize_email(email);
    if email.is_empty() {
        return;
    }

    if limiter.check(&email).is_err() {
        tracing::warn!(email = %email, "Password reset requests throttled");
        return;
    }
    limiter.record(&email);

    let user = match store.find_user_by_email(&email).await {
        Ok(Some(user)) => user,
        Ok(None) => return,
        Err(e) => {
            tracing::error!("Failed to look up user for password reset: {e}");
            return;
        }
    };

    let issued = match issue_password_reset(store, clock, &user).await {
        Ok(issued) => issued,
        Err(e) => {
            tracing::error!("Failed to create password reset token: {e}");
            return;
        }
    };

    let url = reset_url(base_url, &issued.token);
    if let Err(e) = notifier
        .send_password_reset(&user.email, &url, issued.expires_at)
        .await
    {
        tracing::error!("Failed to send password reset email: {e}");
    }
}

#[derive(Debug)]
pub enum RedeemError {
    Token(ResetTokenError),
    Validation(Vec<String>),
    Store(StoreError),
    Internal(String),
}

impl From<StoreError> for RedeemError {
    fn from(err: StoreError) -> Self {
        RedeemError::Store(err)
    }
}

impl From<RedeemError> for AppError {
    fn from(err: RedeemError) -> Self {
        match err {
            RedeemError::Token(reason) => {
                tracing::debug!("Rejected password reset token: {reason}");
                AppError::InvalidResetToken
            }
            RedeemError::Validation(errors) => AppError::Validation(errors),
            RedeemError::Store(e) => AppError::Store(e),
            RedeemError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Checks a reset token without consuming it.
pub async fn lookup_reset_token(
    store: &dyn Store,
    clock: &dyn Clock,
    token: &str,
) -> Result<PasswordReset, RedeemError> {
    let reset = store
        .find_password_reset(&hash_token(token.trim()))
        .await?
        .ok_or(RedeemError::Token(ResetTokenError::NotFound))?;
    reset
        .check_redeemable(clock.now())
        .map_err(RedeemError::Token)?;
    Ok(reset)
}

/// Sets a new password using a reset token. Succeeds at most once per token.
pub async fn redeem_password_reset(
    store: &dyn Store,
    clock: &dyn Clock,
    token: &str,
    new_password: &str,
    confirm_password: &str,
) -> Result<(), RedeemError> {
    let reset = lookup_reset_token(store, clock, token).await?;

    let errors = validation::validate_new_password(new_password, confirm_password);
    if !errors.is_empty() {
        return Err(RedeemError::Validation(errors));
    }

    let password_hash = password::hash(new_password).map_err(RedeemError::Internal)?;

    let redeemed = store
        .redeem_password_reset(reset.id, reset.user_id, &password_hash, clock.now())
        .await?;
    if !redeemed {
        // Lost a race with another redemption, or expired in between
        return Err(RedeemError::Token(ResetTokenError::AlreadyUsed));
    }

    tracing::info!(user_id = %reset.user_id, "Password reset redeemed");
    Ok(())
}
