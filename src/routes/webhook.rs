use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;

use crate::{
    dto::webhook_dto::{PaymentSettledWebhook, SweepRequest, SweepResponse},
    error::{Error, Result},
    models::timecard::Timecard,
    utils::signature::secrets_match,
    AppState,
};

/// Settlement callback: the only path to `paid`.
#[utoipa::path(
    post,
    path = "/api/webhook/payments/settled",
    request_body = PaymentSettledWebhook,
    responses(
        (status = 200, description = "Timecard marked paid", body = Timecard),
        (status = 401, description = "Missing or wrong webhook secret"),
        (status = 409, description = "Timecard is not approved")
    )
)]
pub async fn payment_settled(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<PaymentSettledWebhook>,
) -> Result<Json<Timecard>> {
    verify_secret(&headers, &state.webhook_secret)?;
    let timecard = state.timecard_service.mark_paid(payload.timecard_id).await?;
    Ok(Json(timecard))
}

/// Runs the auto-approval sweep for an external scheduler.
#[utoipa::path(
    post,
    path = "/api/internal/timecards/sweep",
    request_body = SweepRequest,
    responses(
        (status = 200, description = "Ids of timecards auto-approved by this run", body = SweepResponse),
        (status = 401, description = "Missing or wrong webhook secret")
    )
)]
pub async fn run_sweep(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Option<Json<SweepRequest>>,
) -> Result<(StatusCode, Json<SweepResponse>)> {
    verify_secret(&headers, &state.webhook_secret)?;
    let now = payload.and_then(|Json(req)| req.now).unwrap_or_else(Utc::now);
    let swept = state.timecard_service.sweep_expired(now).await?;
    Ok((
        StatusCode::OK,
        Json(SweepResponse {
            auto_approved: swept.into_iter().map(|t| t.id).collect(),
        }),
    ))
}

fn verify_secret(headers: &HeaderMap, expected: &str) -> Result<()> {
    let Some(secret_hdr) = headers.get("x-webhook-secret") else {
        return Err(Error::Unauthorized("missing_webhook_secret".into()));
    };
    let provided = secret_hdr
        .to_str()
        .map_err(|_| Error::Unauthorized("invalid_secret_header".into()))?;
    if secrets_match(provided, expected) {
        Ok(())
    } else {
        Err(Error::Unauthorized("invalid_webhook_secret".into()))
    }
}
