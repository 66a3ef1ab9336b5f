use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::{
    Delivery, DeliveryStatus, NewDelivery, NewPasswordReset, NewUser, PasswordReset, User,
};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, full_name, password_hash)
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_delivery(&self, delivery: NewDelivery) -> Result<Delivery, StoreError> {
        let delivered_at = delivery.initial_delivered_at();
        let delivery = sqlx::query_as::<_, Delivery>(
            "INSERT INTO deliveries
                (id, user_id, tracking_number, amount_due, status, address, latitude, longitude,
                 created_at, delivered_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(delivery.user_id)
        .bind(&delivery.tracking_number)
        .bind(delivery.amount_due)
        .bind(delivery.status)
        .bind(&delivery.address)
        .bind(delivery.latitude)
        .bind(delivery.longitude)
        .bind(delivery.created_at)
        .bind(delivered_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(delivery)
    }

    async fn find_delivery(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Delivery>, StoreError> {
        let delivery = sqlx::query_as::<_, Delivery>(
            "SELECT * FROM deliveries WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(delivery)
    }

    async fn find_visible_by_tracking_number(
        &self,
        user_id: Uuid,
        tracking_number: &str,
    ) -> Result<Option<Delivery>, StoreError> {
        let delivery = sqlx::query_as::<_, Delivery>(
            "SELECT * FROM deliveries
             WHERE user_id = $1 AND tracking_number = $2 AND deleted_at IS NULL
             LIMIT 1",
        )
        .bind(user_id)
        .bind(tracking_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(delivery)
    }

    async fn list_deliveries(
        &self,
        user_id: Uuid,
        include_deleted: bool,
    ) -> Result<Vec<Delivery>, StoreError> {
        let deliveries = sqlx::query_as::<_, Delivery>(
            "SELECT * FROM deliveries
             WHERE user_id = $1 AND ($2 OR deleted_at IS NULL)
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .bind(include_deleted)
        .fetch_all(&self.pool)
        .await?;
        Ok(deliveries)
    }

    async fn count_deliveries(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM deliveries WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn count_visible_by_status(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(DeliveryStatus, i64)>, StoreError> {
        let rows = sqlx::query_as::<_, (DeliveryStatus, i64)>(
            "SELECT status, COUNT(*) FROM deliveries
             WHERE user_id = $1 AND deleted_at IS NULL
             GROUP BY status",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update_delivery_status(
        &self,
        id: Uuid,
        user_id: Uuid,
        status: DeliveryStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Delivery>, StoreError> {
        let delivery = sqlx::query_as::<_, Delivery>(
            "UPDATE deliveries SET status = $3, delivered_at = $4
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
             RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .bind(status)
        .bind(delivered_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(delivery)
    }

    async fn soft_delete_delivery(
        &self,
        id: Uuid,
        user_id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> Result<Option<Delivery>, StoreError> {
        let delivery = sqlx::query_as::<_, Delivery>(
            "UPDATE deliveries SET deleted_at = COALESCE(deleted_at, $3)
             WHERE id = $1 AND user_id = $2
             RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .bind(deleted_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(delivery)
    }

    async fn restore_delivery(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Delivery>, StoreError> {
        let delivery = sqlx::query_as::<_, Delivery>(
            "UPDATE deliveries SET deleted_at = NULL
             WHERE id = $1 AND user_id = $2
             RETURNING *",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(delivery)
    }

    async fn create_password_reset(
        &self,
        reset: NewPasswordReset,
    ) -> Result<PasswordReset, StoreError> {
        let reset = sqlx::query_as::<_, PasswordReset>(
            "INSERT INTO password_resets (id, user_id, token_hash, expires_at)
             VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(reset.user_id)
        .bind(&reset.token_hash)
        .bind(reset.expires_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(reset)
    }

    async fn find_password_reset(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordReset>, StoreError> {
        let reset = sqlx::query_as::<_, PasswordReset>(
            "SELECT * FROM password_resets WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(reset)
    }

    async fn redeem_password_reset(
        &self,
        reset_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
        used_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let marked = sqlx::query(
            "UPDATE password_resets SET used_at = $3
             WHERE id = $1 AND user_id = $2 AND used_at IS NULL AND expires_at > $3",
        )
        .bind(reset_id)
        .bind(user_id)
        .bind(used_at)
        .execute(&mut *tx)
        .await?;

        if marked.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}
