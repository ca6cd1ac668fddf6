use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::Result;
use crate::services::timecard_service::TimecardSubmission;
use crate::utils::time::parse_clock_time;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitTimecardPayload {
    pub shift_date: NaiveDate,
    /// Wall-clock `HH:MM`.
    #[validate(length(min = 4, max = 8))]
    pub start_time: String,
    #[validate(length(min = 4, max = 8))]
    pub end_time: String,
    #[serde(default)]
    #[validate(range(min = 0, max = 720))]
    pub break_minutes: i64,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

impl SubmitTimecardPayload {
    pub fn into_submission(self) -> Result<TimecardSubmission> {
        Ok(TimecardSubmission {
            shift_date: self.shift_date,
            start_time: parse_clock_time(&self.start_time)?,
            end_time: parse_clock_time(&self.end_time)?,
            break_minutes: self.break_minutes,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RejectTimecardPayload {
    #[validate(length(min = 1, max = 2000))]
    pub reason: String,
}
