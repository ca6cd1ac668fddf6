use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::timecard_dto::RejectTimecardPayload,
    error::{Error, Result},
    middleware::auth::{Claims, Role},
    models::timecard::Timecard,
    utils::validation::validated,
    AppState,
};

async fn timecard_for_party(state: &AppState, id: Uuid, user_id: Uuid) -> Result<Timecard> {
    let timecard = state.timecard_service.get(id).await?;
    if timecard.nurse_id != user_id && timecard.client_id != user_id {
        return Err(Error::Forbidden("Not a party to this timecard".into()));
    }
    Ok(timecard)
}

#[utoipa::path(
    get,
    path = "/api/timecards/{id}",
    params(("id" = Uuid, Path, description = "Timecard ID")),
    responses(
        (status = 200, description = "Timecard found", body = Timecard),
        (status = 404, description = "Timecard not found")
    )
)]
#[axum::debug_handler]
pub async fn get_timecard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user_id = claims.require_role(&[Role::Client, Role::Nurse])?;
    let timecard = timecard_for_party(&state, id, user_id).await?;
    Ok(Json(timecard))
}

#[utoipa::path(
    post,
    path = "/api/timecards/{id}/approve",
    params(("id" = Uuid, Path, description = "Timecard ID")),
    responses(
        (status = 200, description = "Timecard approved and payout authorized", body = Timecard),
        (status = 409, description = "Timecard already decided")
    )
)]
#[axum::debug_handler]
pub async fn approve_timecard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let client_id = claims.require_role(&[Role::Client])?;
    let timecard = state.timecard_service.approve(id, client_id).await?;
    Ok(Json(timecard))
}

#[utoipa::path(
    post,
    path = "/api/timecards/{id}/reject",
    params(("id" = Uuid, Path, description = "Timecard ID")),
    request_body = RejectTimecardPayload,
    responses(
        (status = 200, description = "Timecard rejected", body = Timecard),
        (status = 400, description = "Missing reason"),
        (status = 409, description = "Timecard already decided")
    )
)]
#[axum::debug_handler]
pub async fn reject_timecard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectTimecardPayload>,
) -> Result<impl IntoResponse> {
    let client_id = claims.require_role(&[Role::Client])?;
    let payload = validated(payload)?;
    let timecard = state
        .timecard_service
        .reject(id, client_id, &payload.reason)
        .await?;
    Ok(Json(timecard))
}

#[utoipa::path(
    get,
    path = "/api/timecards/{id}/payout",
    params(("id" = Uuid, Path, description = "Timecard ID")),
    responses(
        (status = 200, description = "Payout authorization", body = Payout),
        (status = 404, description = "Timecard not yet payable")
    )
)]
#[axum::debug_handler]
pub async fn get_payout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user_id = claims.require_role(&[Role::Client, Role::Nurse])?;
    timecard_for_party(&state, id, user_id).await?;
    let payout = state
        .payment_service
        .get_for_timecard(id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("No payout authorized for timecard {}", id)))?;
    Ok(Json(payout))
}
