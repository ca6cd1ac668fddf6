use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// A one-time authorization handed to the payment processor.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Payout {
    pub id: Uuid,
    pub timecard_id: Uuid,
    pub nurse_id: Uuid,
    pub worked_minutes: i32,
    pub hourly_rate: Decimal,
    pub platform_fee_rate: Decimal,
    pub nurse_earnings: Decimal,
    pub platform_fee: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
}
