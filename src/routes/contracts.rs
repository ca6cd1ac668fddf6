use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::{contract_dto::ContractResponse, timecard_dto::SubmitTimecardPayload},
    error::{Error, Result},
    middleware::auth::{Claims, Role},
    models::contract::{Contract, PartyRole},
    utils::validation::validated,
    AppState,
};

async fn contract_for_party(state: &AppState, id: Uuid, user_id: Uuid) -> Result<Contract> {
    let contract = state.contract_service.get(id).await?;
    if contract.party_role(user_id).is_none() {
        return Err(Error::Forbidden("Not a party to this contract".into()));
    }
    Ok(contract)
}

#[utoipa::path(
    get,
    path = "/api/contracts/{id}",
    params(("id" = Uuid, Path, description = "Contract ID")),
    responses(
        (status = 200, description = "Contract with its frozen terms", body = ContractResponse),
        (status = 403, description = "Caller is not a party")
    )
)]
#[axum::debug_handler]
pub async fn get_contract(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user_id = claims.require_role(&[Role::Client, Role::Nurse])?;
    let contract = contract_for_party(&state, id, user_id).await?;
    Ok(Json(ContractResponse {
        contract,
        review_window_hours: state.policy.review_window.num_hours(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/contracts/{id}/accept",
    params(("id" = Uuid, Path, description = "Contract ID")),
    responses(
        (status = 200, description = "Contract active", body = Contract),
        (status = 409, description = "Contract is not pending")
    )
)]
#[axum::debug_handler]
pub async fn accept_contract(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let nurse_id = claims.require_role(&[Role::Nurse])?;
    let contract = state.contract_service.accept(id, nurse_id).await?;
    Ok(Json(contract))
}

#[utoipa::path(
    post,
    path = "/api/contracts/{id}/complete",
    params(("id" = Uuid, Path, description = "Contract ID")),
    responses(
        (status = 200, description = "Contract completed", body = Contract),
        (status = 409, description = "Contract is not active")
    )
)]
#[axum::debug_handler]
pub async fn complete_contract(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user_id = claims.require_role(&[Role::Client, Role::Nurse])?;
    let role = match claims.role() {
        Some(Role::Nurse) => PartyRole::Nurse,
        _ => PartyRole::Client,
    };
    let contract = state.contract_service.complete(id, user_id, role).await?;
    Ok(Json(contract))
}

#[utoipa::path(
    post,
    path = "/api/contracts/{id}/timecards",
    params(("id" = Uuid, Path, description = "Contract ID")),
    request_body = SubmitTimecardPayload,
    responses(
        (status = 201, description = "Timecard submitted", body = Timecard),
        (status = 409, description = "Contract is not active"),
        (status = 422, description = "Shift interval is invalid")
    )
)]
#[axum::debug_handler]
pub async fn submit_timecard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SubmitTimecardPayload>,
) -> Result<impl IntoResponse> {
    let nurse_id = claims.require_role(&[Role::Nurse])?;
    let submission = validated(payload)?.into_submission()?;
    let timecard = state.timecard_service.submit(id, nurse_id, submission).await?;
    Ok((StatusCode::CREATED, Json(timecard)))
}

#[utoipa::path(
    get,
    path = "/api/contracts/{id}/timecards",
    params(("id" = Uuid, Path, description = "Contract ID")),
    responses((status = 200, description = "Timecards of the contract", body = [Timecard]))
)]
#[axum::debug_handler]
pub async fn list_timecards(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user_id = claims.require_role(&[Role::Client, Role::Nurse])?;
    contract_for_party(&state, id, user_id).await?;
    let timecards = state.timecard_service.list_for_contract(id).await?;
    Ok(Json(timecards))
}
