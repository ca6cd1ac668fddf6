use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::Result;

text_enum! {
    pub enum ContractStatus {
        Pending => "pending",
        Active => "active",
        Completed => "completed",
    }
}

text_enum! {
    /// Which side of a contract is acting.
    pub enum PartyRole {
        Client => "client",
        Nurse => "nurse",
    }
}

impl ContractStatus {
    pub fn can_transition_to(&self, next: ContractStatus) -> bool {
        matches!(
            (self, next),
            (ContractStatus::Pending, ContractStatus::Active)
                | (ContractStatus::Active, ContractStatus::Completed)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Contract {
    pub id: Uuid,
    pub job_id: Uuid,
    pub application_id: Uuid,
    pub nurse_id: Uuid,
    pub client_id: Uuid,
    pub care_type: String,
    pub terms_text: String,
    pub hourly_rate: Decimal,
    pub rate_guidance_min: Decimal,
    pub rate_guidance_max: Decimal,
    pub status: String,
    pub accepted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    pub fn contract_status(&self) -> Result<ContractStatus> {
        super::parse_stored(&self.status)
    }

    /// The role `user_id` plays on this contract, if any.
    pub fn party_role(&self, user_id: Uuid) -> Option<PartyRole> {
        if user_id == self.client_id {
            Some(PartyRole::Client)
        } else if user_id == self.nurse_id {
            Some(PartyRole::Nurse)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contract_only_moves_forward() {
        assert!(ContractStatus::Pending.can_transition_to(ContractStatus::Active));
        assert!(ContractStatus::Active.can_transition_to(ContractStatus::Completed));
        assert!(!ContractStatus::Pending.can_transition_to(ContractStatus::Completed));
        assert!(!ContractStatus::Completed.can_transition_to(ContractStatus::Active));
        assert!(!ContractStatus::Active.can_transition_to(ContractStatus::Active));
    }
}
