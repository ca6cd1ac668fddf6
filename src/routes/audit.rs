use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    error::{Error, Result},
    middleware::auth::{Claims, Role},
    AppState,
};

const AUDITED_ENTITIES: [&str; 4] = ["job", "application", "contract", "timecard"];

#[utoipa::path(
    get,
    path = "/api/audit/{entity_type}/{id}",
    params(
        ("entity_type" = String, Path, description = "job, application, contract or timecard"),
        ("id" = Uuid, Path, description = "Entity ID")
    ),
    responses(
        (status = 200, description = "Audit entries, oldest first"),
        (status = 400, description = "Unknown entity type")
    )
)]
#[axum::debug_handler]
pub async fn entity_audit_trail(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((entity_type, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse> {
    claims.require_role(&[Role::Admin])?;
    if !AUDITED_ENTITIES.contains(&entity_type.as_str()) {
        return Err(Error::BadRequest(format!("Unknown entity type '{}'", entity_type)));
    }
    let entries = state.audit_service.list_for_entity(&entity_type, id).await?;
    Ok(Json(entries))
}
