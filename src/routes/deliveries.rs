use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::Delivery;
use crate::services::deliveries::{self, DeliveryInput, StatusSummary};
use crate::state::SharedState;

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub include_deleted: bool,
}

#[derive(Deserialize)]
pub struct CreateDelivery {
    #[serde(default)]
    pub tracking_number: String,
    /// Accepts `500` or `"500"`.
    #[serde(default)]
    pub amount_due: Value,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Deserialize)]
pub struct UpdateStatus {
    #[serde(default)]
    pub status: String,
}

fn amount_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub async fn list(
    auth: AuthUser,
    State(state): State<SharedState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Delivery>>, AppError> {
    let deliveries = deliveries::list(state.store.as_ref(), &auth, query.include_deleted).await?;
    Ok(Json(deliveries))
}

pub async fn create(
    auth: AuthUser,
    State(state): State<SharedState>,
    Json(req): Json<CreateDelivery>,
) -> Result<(StatusCode, Json<Delivery>), AppError> {
    let input = DeliveryInput {
        tracking_number: req.tracking_number,
        amount_due: amount_text(&req.amount_due),
        address: req.address,
        latitude: req.latitude,
        longitude: req.longitude,
    };
    let delivery = deliveries::add(state.store.as_ref(), state.clock.as_ref(), &auth, input).await?;
    Ok((StatusCode::CREATED, Json(delivery)))
}

pub async fn get(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Delivery>, AppError> {
    Ok(Json(deliveries::get(state.store.as_ref(), &auth, id).await?))
}

pub async fn summary(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<Json<StatusSummary>, AppError> {
    Ok(Json(deliveries::summary(state.store.as_ref(), &auth).await?))
}

pub async fn update_status(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatus>,
) -> Result<Json<Delivery>, AppError> {
    let delivery = deliveries::update_status(
        state.store.as_ref(),
        state.clock.as_ref(),
        &auth,
        id,
        &req.status,
    )
    .await?;
    Ok(Json(delivery))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Delivery>, AppError> {
    let delivery =
        deliveries::soft_delete(state.store.as_ref(), state.clock.as_ref(), &auth, id).await?;
    Ok(Json(delivery))
}

pub async fn restore(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Delivery>, AppError> {
    Ok(Json(deliveries::restore(state.store.as_ref(), &auth, id).await?))
}

pub async fn seed_demo(
    auth: AuthUser,
    State(state): State<SharedState>,
) -> Result<(StatusCode, Json<Vec<Delivery>>), AppError> {
    let created = deliveries::seed_demo(state.store.as_ref(), state.clock.as_ref(), &auth).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
