use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::Result;

text_enum! {
    pub enum TimecardStatus {
        Submitted => "submitted",
        Approved => "approved",
        AutoApproved => "auto_approved",
        Rejected => "rejected",
        Paid => "paid",
    }
}

impl TimecardStatus {
    /// Approved either by the client or by the deadline sweep.
    pub fn is_payable(&self) -> bool {
        matches!(self, TimecardStatus::Approved | TimecardStatus::AutoApproved)
    }

    pub fn can_transition_to(&self, next: TimecardStatus) -> bool {
        use TimecardStatus::*;
        match (self, next) {
            (Submitted, Approved) | (Submitted, AutoApproved) | (Submitted, Rejected) => true,
            (from, Paid) => from.is_payable(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Timecard {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub job_id: Uuid,
    pub nurse_id: Uuid,
    pub client_id: Uuid,
    pub shift_date: NaiveDate,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub rounded_start_at: DateTime<Utc>,
    pub rounded_end_at: DateTime<Utc>,
    pub break_minutes: i32,
    pub is_overnight: bool,
    pub worked_minutes: i32,
    pub total_hours: Decimal,
    pub notes: Option<String>,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub decided_by: Option<Uuid>,
    pub decided_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub timestamp_submitted: DateTime<Utc>,
    pub approval_deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Timecard {
    pub fn timecard_status(&self) -> Result<TimecardStatus> {
        super::parse_stored(&self.status)
    }

    /// Exact payable hours; `total_hours` is the two-place display value.
    pub fn payable_hours(&self) -> Decimal {
        Decimal::from(self.worked_minutes) / Decimal::from(60)
    }
}

#[cfg(test)]
mod tests {
    use super::TimecardStatus::{self, *};

    #[test]
    fn only_submitted_cards_are_decided() {
        for next in [Approved, AutoApproved, Rejected] {
            assert!(Submitted.can_transition_to(next));
            for from in [Approved, AutoApproved, Rejected, Paid] {
                assert!(!from.can_transition_to(next), "{} -> {}", from, next);
            }
        }
    }

    #[test]
    fn paid_follows_approval_only() {
        assert!(Approved.can_transition_to(Paid));
        assert!(AutoApproved.can_transition_to(Paid));
        assert!(!Rejected.can_transition_to(Paid));
        assert!(!Submitted.can_transition_to(Paid));
        assert!(!Paid.can_transition_to(Paid));
    }

    #[test]
    fn auto_approved_spelling() {
        assert_eq!(AutoApproved.as_str(), "auto_approved");
        assert_eq!(
            serde_json::to_string(&AutoApproved).unwrap(),
            "\"auto_approved\""
        );
        assert_eq!(TimecardStatus::ALL.len(), 5);
    }
}
