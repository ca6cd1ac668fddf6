use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::application::ApplicationStatus;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitApplicationPayload {
    #[validate(length(max = 4000))]
    pub cover_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct TransitionApplicationPayload {
    pub status: ApplicationStatus,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}
