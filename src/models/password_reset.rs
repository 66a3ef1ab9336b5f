use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct PasswordReset {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPasswordReset {
    pub user_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// Why a reset token was refused. Callers only ever see one generic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTokenError {
    NotFound,
    Expired,
    AlreadyUsed,
}

impl std::fmt::Display for ResetTokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResetTokenError::NotFound => write!(f, "token not found"),
            ResetTokenError::Expired => write!(f, "token expired"),
            ResetTokenError::AlreadyUsed => write!(f, "token already used"),
        }
    }
}

impl PasswordReset {
    /// A token is redeemable while unused and strictly before its expiry.
    pub fn check_redeemable(&self, now: DateTime<Utc>) -> Result<(), ResetTokenError> {
        if self.used_at.is_some() {
            return Err(ResetTokenError::AlreadyUsed);
        }
        if now >= self.expires_at {
            return Err(ResetTokenError::Expired);
        }
        Ok(())
    }
}
