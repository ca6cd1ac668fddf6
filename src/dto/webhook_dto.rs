use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Settlement callback from the payment processor.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentSettledWebhook {
    pub timecard_id: Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SweepRequest {
    /// Overrides the sweep clock; defaults to the current time.
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SweepResponse {
    pub auto_approved: Vec<Uuid>,
}
