pub mod applications;
pub mod audit;
pub mod contracts;
pub mod health;
pub mod jobs;
pub mod openapi;
pub mod timecards;
pub mod webhook;

use axum::{
    routing::{get, post},
    Router,
};

use crate::middleware::{
    auth::require_bearer_auth,
    rate_limit::{rps_middleware, RateLimiter},
};
use crate::AppState;

/// Every route of the service, without the outer tower layers.
pub fn router(state: AppState, public_rps: u32, integration_rps: u32) -> Router {
    let base_routes = Router::new()
        .route("/health", get(health::health))
        .route("/api/openapi.json", get(openapi::openapi_json));

    let marketplace_api = Router::new()
        .route("/api/jobs", post(jobs::create_job))
        .route("/api/jobs/:id", get(jobs::get_job))
        .route("/api/jobs/:id/cancel", post(jobs::cancel_job))
        .route(
            "/api/jobs/:id/applications",
            get(jobs::list_job_applications).post(jobs::submit_application),
        )
        .route("/api/applications/mine", get(applications::my_applications))
        .route(
            "/api/applications/:id/status",
            post(applications::transition_application),
        )
        .route(
            "/api/applications/:id",
            axum::routing::delete(applications::withdraw_application),
        )
        .route("/api/contracts/:id", get(contracts::get_contract))
        .route("/api/contracts/:id/accept", post(contracts::accept_contract))
        .route("/api/contracts/:id/complete", post(contracts::complete_contract))
        .route(
            "/api/contracts/:id/timecards",
            get(contracts::list_timecards).post(contracts::submit_timecard),
        )
        .route("/api/timecards/:id", get(timecards::get_timecard))
        .route("/api/timecards/:id/approve", post(timecards::approve_timecard))
        .route("/api/timecards/:id/reject", post(timecards::reject_timecard))
        .route("/api/timecards/:id/payout", get(timecards::get_payout))
        .route("/api/audit/:entity_type/:id", get(audit::entity_audit_trail))
        // inner layer: counts verified callers once auth has attached their claims
        .layer(axum::middleware::from_fn_with_state(
            RateLimiter::new(public_rps),
            rps_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_bearer_auth,
        ));

    let integration_api = Router::new()
        .route("/api/webhook/payments/settled", post(webhook::payment_settled))
        .route("/api/internal/timecards/sweep", post(webhook::run_sweep))
        .layer(axum::middleware::from_fn_with_state(
            RateLimiter::new(integration_rps),
            rps_middleware,
        ));

    base_routes
        .merge(marketplace_api)
        .merge(integration_api)
        .with_state(state)
}
