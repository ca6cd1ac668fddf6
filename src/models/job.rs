use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::Result;

text_enum! {
    pub enum JobStatus {
        Open => "open",
        Filled => "filled",
        Cancelled => "cancelled",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct JobPosting {
    pub id: Uuid,
    pub client_id: Uuid,
    pub title: String,
    pub care_type: String,
    pub hourly_rate: Decimal,
    pub location: Option<String>,
    pub description: Option<String>,
    pub status: String,
    pub filled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobPosting {
    pub fn job_status(&self) -> Result<JobStatus> {
        super::parse_stored(&self.status)
    }
}
