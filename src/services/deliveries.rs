//! Delivery records and their status / soft-delete lifecycle.
//!
//! Status moves freely between `pending`, `delivered` and `not_located`.
//! Soft-deleted deliveries drop out of the default listing and cannot change
//! status until restored. Every operation is scoped to the caller; a delivery
//! owned by someone else is reported as not found.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::clock::Clock;
use crate::error::AppError;
use crate::models::{Delivery, DeliveryStatus, NewDelivery};
use crate::store::Store;
use crate::validation;

#[derive(Debug, Clone, Default)]
pub struct DeliveryInput {
    pub tracking_number: String,
    /// Raw amount in minor units, as typed by the user.
    pub amount_due: String,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub pending: i64,
    pub delivered: i64,
    pub not_located: i64,
    pub total: i64,
}

fn not_found() -> AppError {
    AppError::NotFound("Delivery not found".to_string())
}

pub async fn add(
    store: &dyn Store,
    clock: &dyn Clock,
    ctx: &AuthUser,
    input: DeliveryInput,
) -> Result<Delivery, AppError> {
    let tracking_number = input.tracking_number.trim().to_string();
    let address = input
        .address
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());

    let mut errors = validation::validate_delivery(
        &tracking_number,
        address.as_deref(),
        input.latitude,
        input.longitude,
    );
    let amount_due = match validation::parse_amount(&input.amount_due) {
        Ok(amount) if errors.is_empty() => amount,
        Ok(_) => return Err(AppError::Validation(errors)),
        Err(e) => {
            errors.push(e);
            return Err(AppError::Validation(errors));
        }
    };

    if store
        .find_visible_by_tracking_number(ctx.user_id, &tracking_number)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "Tracking number already exists".to_string(),
        ));
    }

    let delivery = store
        .create_delivery(NewDelivery {
            address,
            latitude: input.latitude,
            longitude: input.longitude,
            ..NewDelivery::pending(ctx.user_id, tracking_number, amount_due, clock.now())
        })
        .await?;

    tracing::info!(user_id = %ctx.user_id, delivery_id = %delivery.id, "Delivery added");
    Ok(delivery)
}

pub async fn list(
    store: &dyn Store,
    ctx: &AuthUser,
    include_deleted: bool,
) -> Result<Vec<Delivery>, AppError> {
    Ok(store.list_deliveries(ctx.user_id, include_deleted).await?)
}

pub async fn get(store: &dyn Store, ctx: &AuthUser, id: Uuid) -> Result<Delivery, AppError> {
    store
        .find_delivery(id, ctx.user_id)
        .await?
        .filter(Delivery::is_visible)
        .ok_or_else(not_found)
}

pub async fn summary(store: &dyn Store, ctx: &AuthUser) -> Result<StatusSummary, AppError> {
    let mut summary = StatusSummary::default();
    for (status, count) in store.count_visible_by_status(ctx.user_id).await? {
        match status {
            DeliveryStatus::Pending => summary.pending += count,
            DeliveryStatus::Delivered => summary.delivered += count,
            DeliveryStatus::NotLocated => summary.not_located += count,
        }
        summary.total += count;
    }
    Ok(summary)
}

/// Entering `delivered` stamps the time once; leaving it clears the stamp.
fn delivered_at_for(
    current: &Delivery,
    status: DeliveryStatus,
    now: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    match status {
        DeliveryStatus::Delivered => current.delivered_at.or(Some(now)),
        _ => None,
    }
}

pub async fn update_status(
    store: &dyn Store,
    clock: &dyn Clock,
    ctx: &AuthUser,
    id: Uuid,
    status: &str,
) -> Result<Delivery, AppError> {
    let status = validation::parse_status(status).map_err(AppError::validation)?;

    let current = get(store, ctx, id).await?;
    let delivered_at = delivered_at_for(&current, status, clock.now());

    store
        .update_delivery_status(id, ctx.user_id, status, delivered_at)
        .await?
        .ok_or_else(not_found)
}

pub async fn soft_delete(
    store: &dyn Store,
    clock: &dyn Clock,
    ctx: &AuthUser,
    id: Uuid,
) -> Result<Delivery, AppError> {
    let delivery = store
        .soft_delete_delivery(id, ctx.user_id, clock.now())
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(user_id = %ctx.user_id, delivery_id = %id, "Delivery deleted");
    Ok(delivery)
}

/// Clears the soft-delete mark. Restoring a delivery that was never deleted is fine.
pub async fn restore(store: &dyn Store, ctx: &AuthUser, id: Uuid) -> Result<Delivery, AppError> {
    let delivery = store
        .restore_delivery(id, ctx.user_id)
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(user_id = %ctx.user_id, delivery_id = %id, "Delivery restored");
    Ok(delivery)
}

const DEMO_DELIVERIES: [(&str, i64, DeliveryStatus, &str, f64, f64); 4] = [
    ("DEMO001", 2500, DeliveryStatus::Pending, "123 Market St", 37.7749, -122.4194),
    ("DEMO002", 1500, DeliveryStatus::Delivered, "1 Ferry Building", 37.7955, -122.3937),
    ("DEMO003", 3000, DeliveryStatus::Pending, "500 Howard St", 37.7890, -122.3912),
    ("DEMO004", 800, DeliveryStatus::NotLocated, "2 Embarcadero Ctr", 37.7946, -122.3999),
];

fn demo_deliveries(user_id: Uuid, now: DateTime<Utc>) -> Vec<NewDelivery> {
    DEMO_DELIVERIES
        .iter()
        .map(|&(tracking, amount, status, address, lat, lng)| NewDelivery {
            status,
            address: Some(address.to_string()),
            latitude: Some(lat),
            longitude: Some(lng),
            ..NewDelivery::pending(user_id, tracking, amount, now)
        })
        .collect()
}

/// Inserts sample deliveries for a user who has never had any.
pub async fn seed_demo(
    store: &dyn Store,
    clock: &dyn Clock,
    ctx: &AuthUser,
) -> Result<Vec<Delivery>, AppError> {
    if store.count_deliveries(ctx.user_id).await? > 0 {
        return Err(AppError::Conflict("Demo data already exists".to_string()));
    }

    let mut created = Vec::new();
    for delivery in demo_deliveries(ctx.user_id, clock.now()) {
        created.push(store.create_delivery(delivery).await?);
    }

    tracing::info!(user_id = %ctx.user_id, count = created.len(), "Demo deliveries seeded");
    Ok(created)
}

/// Login-time seeding. An account with any history is left alone.
pub async fn seed_demo_if_empty(
    store: &dyn Store,
    clock: &dyn Clock,
    ctx: &AuthUser,
) -> Result<(), AppError> {
    match seed_demo(store, clock, ctx).await {
        Ok(_) | Err(AppError::Conflict(_)) => Ok(()),
        Err(e) => Err(e),
    }
}
