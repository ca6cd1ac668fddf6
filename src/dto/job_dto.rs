use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::models::application::Application;
use crate::models::job::JobPosting;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateJobPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Free-form label; unknown values fall back to `general`.
    #[validate(length(min = 1))]
    pub care_type: String,
    #[validate(custom(function = "positive_rate"))]
    pub hourly_rate: Decimal,
    pub location: Option<String>,
    pub description: Option<String>,
}

/// Highest hourly rate a posting may carry, in cents.
const MAX_HOURLY_RATE_CENTS: i64 = 1_000_000;

fn positive_rate(rate: &Decimal) -> Result<(), ValidationError> {
    let in_range = rate.is_sign_positive()
        && !rate.is_zero()
        && *rate <= Decimal::new(MAX_HOURLY_RATE_CENTS, 2);
    if in_range && rate.normalize().scale() <= 2 {
        Ok(())
    } else {
        Err(ValidationError::new("hourly_rate_out_of_range"))
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CancelJobResponse {
    pub job: JobPosting,
    pub declined_applications: Vec<Application>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(rate: Decimal) -> CreateJobPayload {
        CreateJobPayload {
            title: "Night support".into(),
            care_type: "elderly care".into(),
            hourly_rate: rate,
            location: None,
            description: None,
        }
    }

    #[test]
    fn rate_must_be_positive_cents() {
        assert!(payload(Decimal::new(4550, 2)).validate().is_ok());
        assert!(payload(Decimal::ZERO).validate().is_err());
        assert!(payload(Decimal::new(-10, 0)).validate().is_err());
        assert!(payload(Decimal::new(12345, 3)).validate().is_err());
    }

    #[test]
    fn trailing_zeros_count_as_whole_cents() {
        assert!(payload(Decimal::new(45500, 3)).validate().is_ok());
        assert!(payload(Decimal::new(4500000, 5)).validate().is_ok());
    }

    #[test]
    fn rate_has_an_upper_bound() {
        assert!(payload(Decimal::new(1_000_000, 2)).validate().is_ok());
        assert!(payload(Decimal::new(1_000_001, 2)).validate().is_err());
        assert!(payload(Decimal::new(100_000_000_000, 2)).validate().is_err());
    }
}
