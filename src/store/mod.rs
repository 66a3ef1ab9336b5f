//! Persistence for users, deliveries and password reset tokens.
//!
//! Every delivery query is owner-scoped: it filters on both the delivery id
//! and the requesting user's id, so a foreign id behaves exactly like a
//! missing one.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    Delivery, DeliveryStatus, NewDelivery, NewPasswordReset, NewUser, PasswordReset, User,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug)]
pub enum StoreError {
    /// A unique constraint rejected the write. Carries the constraint name.
    UniqueViolation(String),
    Backend(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::UniqueViolation(constraint) => {
                write!(f, "unique constraint violated: {constraint}")
            }
            StoreError::Backend(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::UniqueViolation(db_err.constraint().unwrap_or("unique").to_string())
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError>;

    async fn create_delivery(&self, delivery: NewDelivery) -> Result<Delivery, StoreError>;

    /// Owned delivery by id, soft-deleted or not.
    async fn find_delivery(&self, id: Uuid, user_id: Uuid)
    -> Result<Option<Delivery>, StoreError>;

    async fn find_visible_by_tracking_number(
        &self,
        user_id: Uuid,
        tracking_number: &str,
    ) -> Result<Option<Delivery>, StoreError>;

    /// Newest first.
    async fn list_deliveries(
        &self,
        user_id: Uuid,
        include_deleted: bool,
    ) -> Result<Vec<Delivery>, StoreError>;

    /// Every delivery the user owns, including soft-deleted ones.
    async fn count_deliveries(&self, user_id: Uuid) -> Result<i64, StoreError>;

    /// Visible deliveries grouped by status. Statuses with no rows may be absent.
    async fn count_visible_by_status(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(DeliveryStatus, i64)>, StoreError>;

    /// Overwrites status and delivered_at of a visible, owned delivery.
    async fn update_delivery_status(
        &self,
        id: Uuid,
        user_id: Uuid,
        status: DeliveryStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Delivery>, StoreError>;

    /// Sets deleted_at unless it is already set.
    async fn soft_delete_delivery(
        &self,
        id: Uuid,
        user_id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> Result<Option<Delivery>, StoreError>;

    async fn restore_delivery(&self, id: Uuid, user_id: Uuid)
    -> Result<Option<Delivery>, StoreError>;

    async fn create_password_reset(
        &self,
        reset: NewPasswordReset,
    ) -> Result<PasswordReset, StoreError>;

    async fn find_password_reset(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordReset>, StoreError>;

    /// Marks the token used and stores the new password hash as one unit.
    ///
    /// Returns `false` without writing anything when the token was already
    /// used or has expired by `used_at`.
    async fn redeem_password_reset(
        &self,
        reset_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
        used_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}
