use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::{
        application_dto::SubmitApplicationPayload,
        job_dto::{CancelJobResponse, CreateJobPayload},
    },
    error::{Error, Result},
    middleware::auth::{Claims, Role},
    utils::validation::validated,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/jobs",
    request_body = CreateJobPayload,
    responses(
        (status = 201, description = "Job posted", body = JobPosting),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Caller is not a client")
    )
)]
#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateJobPayload>,
) -> Result<impl IntoResponse> {
    let client_id = claims.require_role(&[Role::Client])?;
    let payload = validated(payload)?;
    let job = state.job_service.create(client_id, payload).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job found", body = JobPosting),
        (status = 404, description = "Job not found")
    )
)]
#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    claims.user_id()?;
    let job = state.job_service.get(id).await?;
    Ok(Json(job))
}

#[utoipa::path(
    post,
    path = "/api/jobs/{id}/cancel",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job cancelled, live applications declined", body = CancelJobResponse),
        (status = 409, description = "Job is not open")
    )
)]
#[axum::debug_handler]
pub async fn cancel_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let client_id = claims.require_role(&[Role::Client])?;
    let (job, declined_applications) = state.job_service.cancel(id, client_id).await?;
    Ok(Json(CancelJobResponse {
        job,
        declined_applications,
    }))
}

#[utoipa::path(
    post,
    path = "/api/jobs/{id}/applications",
    params(("id" = Uuid, Path, description = "Job ID")),
    request_body = SubmitApplicationPayload,
    responses(
        (status = 201, description = "Application submitted", body = Application),
        (status = 409, description = "Duplicate application or job not open")
    )
)]
#[axum::debug_handler]
pub async fn submit_application(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<SubmitApplicationPayload>,
) -> Result<impl IntoResponse> {
    let nurse_id = claims.require_role(&[Role::Nurse])?;
    let payload = validated(payload)?;
    let application = state
        .application_service
        .submit(nurse_id, job_id, payload.cover_message)
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

#[utoipa::path(
    get,
    path = "/api/jobs/{id}/applications",
    params(("id" = Uuid, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Applications for the job", body = [Application]),
        (status = 403, description = "Caller does not own the job")
    )
)]
#[axum::debug_handler]
pub async fn list_job_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let client_id = claims.require_role(&[Role::Client])?;
    let job = state.job_service.get(job_id).await?;
    if job.client_id != client_id {
        return Err(Error::Forbidden("Only the posting client can list applications".into()));
    }
    let applications = state.application_service.list_for_job(job_id).await?;
    Ok(Json(applications))
}
