use axum::Json;
use utoipa::OpenApi;

use crate::dto::{
    application_dto::{SubmitApplicationPayload, TransitionApplicationPayload},
    contract_dto::ContractResponse,
    job_dto::{CancelJobResponse, CreateJobPayload},
    timecard_dto::{RejectTimecardPayload, SubmitTimecardPayload},
    webhook_dto::{PaymentSettledWebhook, SweepRequest, SweepResponse},
};
use crate::models::{
    application::{Application, ApplicationStatus},
    contract::{Contract, ContractStatus},
    job::{JobPosting, JobStatus},
    payout::Payout,
    timecard::{Timecard, TimecardStatus},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::jobs::create_job,
        super::jobs::get_job,
        super::jobs::cancel_job,
        super::jobs::submit_application,
        super::jobs::list_job_applications,
        super::applications::my_applications,
        super::applications::transition_application,
        super::applications::withdraw_application,
        super::contracts::get_contract,
        super::contracts::accept_contract,
        super::contracts::complete_contract,
        super::contracts::submit_timecard,
        super::contracts::list_timecards,
        super::timecards::get_timecard,
        super::timecards::approve_timecard,
        super::timecards::reject_timecard,
        super::timecards::get_payout,
        super::audit::entity_audit_trail,
        super::webhook::payment_settled,
        super::webhook::run_sweep,
    ),
    components(schemas(
        JobPosting,
        JobStatus,
        Application,
        ApplicationStatus,
        Contract,
        ContractStatus,
        ContractResponse,
        Timecard,
        TimecardStatus,
        Payout,
        CreateJobPayload,
        CancelJobResponse,
        SubmitApplicationPayload,
        TransitionApplicationPayload,
        SubmitTimecardPayload,
        RejectTimecardPayload,
        PaymentSettledWebhook,
        SweepRequest,
        SweepResponse,
    )),
    tags((name = "care-marketplace", description = "Nurse hiring and work verification"))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
