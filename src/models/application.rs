use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::Result;

text_enum! {
    pub enum ApplicationStatus {
        New => "new",
        Shortlisted => "shortlisted",
        Hired => "hired",
        Declined => "declined",
    }
}

impl ApplicationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Hired | ApplicationStatus::Declined)
    }

    /// `hired` is only reachable from `shortlisted`; any live application may be declined.
    pub fn can_transition_to(&self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        match (self, next) {
            (New, Shortlisted) | (Shortlisted, Hired) => true,
            (from, Declined) => !from.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub nurse_id: Uuid,
    pub cover_message: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn application_status(&self) -> Result<ApplicationStatus> {
        super::parse_stored(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::ApplicationStatus::{self, *};

    #[test]
    fn transition_table() {
        let legal = [
            (New, Shortlisted),
            (New, Declined),
            (Shortlisted, Hired),
            (Shortlisted, Declined),
        ];
        for from in ApplicationStatus::ALL {
            for to in ApplicationStatus::ALL {
                assert_eq!(
                    from.can_transition_to(*to),
                    legal.contains(&(*from, *to)),
                    "{} -> {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn hired_and_declined_are_terminal() {
        assert!(Hired.is_terminal());
        assert!(Declined.is_terminal());
        assert!(!New.is_terminal());
        assert!(!Shortlisted.is_terminal());
    }

    #[test]
    fn text_form_round_trips() {
        for status in ApplicationStatus::ALL {
            assert_eq!(status.as_str().parse::<ApplicationStatus>().unwrap(), *status);
        }
        assert!("withdrawn".parse::<ApplicationStatus>().is_err());
        assert_eq!(serde_json::to_string(&Shortlisted).unwrap(), "\"shortlisted\"");
    }
}
