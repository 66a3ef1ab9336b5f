use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::{
    Delivery, DeliveryStatus, NewDelivery, NewPasswordReset, NewUser, PasswordReset, User,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    deliveries: HashMap<Uuid, Delivery>,
    password_resets: HashMap<Uuid, PasswordReset>,
}

impl Tables {
    fn owned_delivery_mut(&mut self, id: Uuid, user_id: Uuid) -> Option<&mut Delivery> {
        self.deliveries
            .get_mut(&id)
            .filter(|delivery| delivery.user_id == user_id)
    }
}

/// Process-local store. Nothing survives a restart.
///
/// One lock guards all tables and is released before every `.await`, so each
/// trait method is atomic with respect to the others.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::UniqueViolation("users_email_key".to_string()));
        }
        let user = User {
            id: Uuid::now_v7(),
            email: user.email,
            full_name: user.full_name,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.users.get(&id).cloned())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if let Some(user) = tables.users.get_mut(&id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(())
    }

    async fn create_delivery(&self, delivery: NewDelivery) -> Result<Delivery, StoreError> {
        let mut tables = self.lock()?;
        if !tables.users.contains_key(&delivery.user_id) {
            return Err(StoreError::Backend(format!(
                "foreign key violation: user {} does not exist",
                delivery.user_id
            )));
        }
        let delivered_at = delivery.initial_delivered_at();
        let delivery = Delivery {
            id: Uuid::now_v7(),
            user_id: delivery.user_id,
            tracking_number: delivery.tracking_number,
            amount_due: delivery.amount_due,
            status: delivery.status,
            address: delivery.address,
            latitude: delivery.latitude,
            longitude: delivery.longitude,
            created_at: delivery.created_at,
            delivered_at,
            deleted_at: None,
        };
        tables.deliveries.insert(delivery.id, delivery.clone());
        Ok(delivery)
    }

    async fn find_delivery(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Delivery>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .deliveries
            .get(&id)
            .filter(|d| d.user_id == user_id)
            .cloned())
    }

    async fn find_visible_by_tracking_number(
        &self,
        user_id: Uuid,
        tracking_number: &str,
    ) -> Result<Option<Delivery>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .deliveries
            .values()
            .find(|d| {
                d.user_id == user_id && d.is_visible() && d.tracking_number == tracking_number
            })
            .cloned())
    }

    async fn list_deliveries(
        &self,
        user_id: Uuid,
        include_deleted: bool,
    ) -> Result<Vec<Delivery>, StoreError> {
        let tables = self.lock()?;
        let mut deliveries: Vec<Delivery> = tables
            .deliveries
            .values()
            .filter(|d| d.user_id == user_id && (include_deleted || d.is_visible()))
            .cloned()
            .collect();
        deliveries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(deliveries)
    }

    async fn count_deliveries(&self, user_id: Uuid) -> Result<i64, StoreError> {
        let tables = self.lock()?;
        let count = tables
            .deliveries
            .values()
            .filter(|d| d.user_id == user_id)
            .count();
        Ok(count as i64)
    }

    async fn count_visible_by_status(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(DeliveryStatus, i64)>, StoreError> {
        let tables = self.lock()?;
        let mut counts: HashMap<DeliveryStatus, i64> = HashMap::new();
        for delivery in tables
            .deliveries
            .values()
            .filter(|d| d.user_id == user_id && d.is_visible())
        {
            *counts.entry(delivery.status).or_insert(0) += 1;
        }
        Ok(counts.into_iter().collect())
    }

    async fn update_delivery_status(
        &self,
        id: Uuid,
        user_id: Uuid,
        status: DeliveryStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Delivery>, StoreError> {
        let mut tables = self.lock()?;
        let Some(delivery) = tables
            .owned_delivery_mut(id, user_id)
            .filter(|d| d.is_visible())
        else {
            return Ok(None);
        };
        delivery.status = status;
        delivery.delivered_at = delivered_at;
        Ok(Some(delivery.clone()))
    }

    async fn soft_delete_delivery(
        &self,
        id: Uuid,
        user_id: Uuid,
        deleted_at: DateTime<Utc>,
    ) -> Result<Option<Delivery>, StoreError> {
        let mut tables = self.lock()?;
        let Some(delivery) = tables.owned_delivery_mut(id, user_id) else {
            return Ok(None);
        };
        delivery.deleted_at.get_or_insert(deleted_at);
        Ok(Some(delivery.clone()))
    }

    async fn restore_delivery(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Delivery>, StoreError> {
        let mut tables = self.lock()?;
        let Some(delivery) = tables.owned_delivery_mut(id, user_id) else {
            return Ok(None);
        };
        delivery.deleted_at = None;
        Ok(Some(delivery.clone()))
    }

    async fn create_password_reset(
        &self,
        reset: NewPasswordReset,
    ) -> Result<PasswordReset, StoreError> {
        let mut tables = self.lock()?;
        if tables
            .password_resets
            .values()
            .any(|r| r.token_hash == reset.token_hash)
        {
            return Err(StoreError::UniqueViolation(
                "password_resets_token_hash_key".to_string(),
            ));
        }
        let reset = PasswordReset {
            id: Uuid::now_v7(),
            user_id: reset.user_id,
            token_hash: reset.token_hash,
            expires_at: reset.expires_at,
            used_at: None,
            created_at: Utc::now(),
        };
        tables.password_resets.insert(reset.id, reset.clone());
        Ok(reset)
    }

    async fn find_password_reset(
        &self,
        token_hash: &str,
    ) -> Result<Option<PasswordReset>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .password_resets
            .values()
            .find(|r| r.token_hash == token_hash)
            .cloned())
    }

    async fn redeem_password_reset(
        &self,
        reset_id: Uuid,
        user_id: Uuid,
        password_hash: &str,
        used_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tables = self.lock()?;
        let redeemable = tables.password_resets.get(&reset_id).is_some_and(|r| {
            r.user_id == user_id && r.used_at.is_none() && r.expires_at > used_at
        });
        if !redeemable || !tables.users.contains_key(&user_id) {
            return Ok(false);
        }

        if let Some(reset) = tables.password_resets.get_mut(&reset_id) {
            reset.used_at = Some(used_at);
        }
        if let Some(user) = tables.users.get_mut(&user_id) {
            user.password_hash = password_hash.to_string();
        }
        Ok(true)
    }
}
