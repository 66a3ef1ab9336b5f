use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "delivery_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Delivered,
    NotLocated,
}

impl DeliveryStatus {
    pub const ALL: [DeliveryStatus; 3] = [
        DeliveryStatus::Pending,
        DeliveryStatus::Delivered,
        DeliveryStatus::NotLocated,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::NotLocated => "not_located",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeliveryStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown delivery status '{s}'"))
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct Delivery {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tracking_number: String,
    /// Minor currency units (cents).
    pub amount_due: i64,
    pub status: DeliveryStatus,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Delivery {
    pub fn is_visible(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct NewDelivery {
    pub user_id: Uuid,
    pub tracking_number: String,
    pub amount_due: i64,
    pub status: DeliveryStatus,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl NewDelivery {
    pub fn pending(
        user_id: Uuid,
        tracking_number: impl Into<String>,
        amount_due: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            tracking_number: tracking_number.into(),
            amount_due,
            status: DeliveryStatus::Pending,
            address: None,
            latitude: None,
            longitude: None,
            created_at,
        }
    }

    /// Rows inserted as already delivered count as delivered at creation.
    pub fn initial_delivered_at(&self) -> Option<DateTime<Utc>> {
        (self.status == DeliveryStatus::Delivered).then_some(self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_only_canonical_names() {
        assert_eq!("pending".parse::<DeliveryStatus>(), Ok(DeliveryStatus::Pending));
        assert_eq!("delivered".parse::<DeliveryStatus>(), Ok(DeliveryStatus::Delivered));
        assert_eq!("not_located".parse::<DeliveryStatus>(), Ok(DeliveryStatus::NotLocated));
        assert!("cancelled".parse::<DeliveryStatus>().is_err());
        assert!("Pending".parse::<DeliveryStatus>().is_err());
        assert!("".parse::<DeliveryStatus>().is_err());
    }

    #[test]
    fn only_delivered_rows_start_with_delivered_at() {
        let at = Utc::now();
        let pending = NewDelivery::pending(Uuid::now_v7(), "TRK1", 100, at);
        assert_eq!(pending.initial_delivered_at(), None);

        let delivered = NewDelivery {
            status: DeliveryStatus::Delivered,
            ..pending
        };
        assert_eq!(delivered.initial_delivered_at(), Some(at));
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&DeliveryStatus::NotLocated).unwrap();
        assert_eq!(json, "\"not_located\"");
    }
}
