use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::application_dto::TransitionApplicationPayload,
    error::Result,
    middleware::auth::{Claims, Role},
    utils::validation::validated,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/applications/mine",
    responses((status = 200, description = "The caller's applications", body = [Application]))
)]
#[axum::debug_handler]
pub async fn my_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let nurse_id = claims.require_role(&[Role::Nurse])?;
    let applications = state.application_service.list_for_nurse(nurse_id).await?;
    Ok(Json(applications))
}

/// Moving to `hired` fills the job, declines the other applicants and issues
/// the contract in one step.
#[utoipa::path(
    post,
    path = "/api/applications/{id}/status",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = TransitionApplicationPayload,
    responses(
        (status = 200, description = "Application updated; hires include the issued contract"),
        (status = 409, description = "Illegal transition or job already filled")
    )
)]
#[axum::debug_handler]
pub async fn transition_application(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionApplicationPayload>,
) -> Result<impl IntoResponse> {
    let client_id = claims.require_role(&[Role::Client])?;
    let payload = validated(payload)?;
    let outcome = state
        .lifecycle_service
        .transition_application(id, client_id, payload.status, payload.notes)
        .await?;
    Ok(Json(outcome))
}

#[utoipa::path(
    delete,
    path = "/api/applications/{id}",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application withdrawn", body = Application),
        (status = 409, description = "Hired applications cannot be withdrawn")
    )
)]
#[axum::debug_handler]
pub async fn withdraw_application(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let nurse_id = claims.require_role(&[Role::Nurse])?;
    let withdrawn = state.application_service.withdraw(id, nurse_id).await?;
    Ok(Json(withdrawn))
}
