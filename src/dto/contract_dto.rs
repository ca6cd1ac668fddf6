use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::contract::Contract;

/// Contract view handed to either party; `terms_text` is returned verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ContractResponse {
    #[serde(flatten)]
    pub contract: Contract,
    pub review_window_hours: i64,
}
