mod common;

use care_marketplace_backend::{
    config::LifecyclePolicy,
    error::Error,
    models::{
        application::ApplicationStatus, contract::PartyRole, job::JobStatus,
    },
    services::lifecycle_service::TransitionOutcome,
};
use common::{active_contract, post_job, shortlisted_applicant, state_with, test_pool};
use rust_decimal::Decimal;
use tokio_test::{assert_err, assert_ok};
use uuid::Uuid;

#[tokio::test]
async fn hire_fills_job_declines_siblings_and_issues_contract() {
    let Some(pool) = test_pool().await else { return };
    let state = state_with(pool.clone(), LifecyclePolicy::default());

    let client_id = Uuid::new_v4();
    let job = post_job(&state, client_id, Decimal::new(4500, 2)).await;
    let chosen = shortlisted_applicant(&state, &job, Uuid::new_v4()).await;
    let sibling = shortlisted_applicant(&state, &job, Uuid::new_v4()).await;
    let fresh = assert_ok!(
        state
            .application_service
            .submit(Uuid::new_v4(), job.id, None)
            .await
    );

    let outcome = assert_ok!(
        state
            .lifecycle_service
            .transition_application(chosen, client_id, ApplicationStatus::Hired, Some("Great fit".into()))
            .await
    );
    let TransitionOutcome::Hired(hire) = outcome else {
        panic!("hiring must produce a contract");
    };
    assert_eq!(hire.application.status, "hired");
    assert_eq!(hire.contract.status, "pending");
    assert_eq!(hire.contract.hourly_rate, Decimal::new(4500, 2));
    assert!(hire.declined.contains(&sibling));
    assert!(hire.declined.contains(&fresh.id));

    let job = state.job_service.get(job.id).await.expect("job");
    assert_eq!(job.job_status().unwrap(), JobStatus::Filled);
    assert!(job.filled_at.is_some());

    for id in [sibling, fresh.id] {
        let app = state.application_service.get(id).await.expect("sibling");
        assert_eq!(app.application_status().unwrap(), ApplicationStatus::Declined);
    }

    assert!(hire.contract.terms_text.contains("Elderly"));
    assert!(hire.contract.terms_text.contains(&job.id.to_string()));
}

#[tokio::test]
async fn concurrent_hires_leave_exactly_one_winner() {
    let Some(pool) = test_pool().await else { return };
    let state = state_with(pool.clone(), LifecyclePolicy::default());

    let client_id = Uuid::new_v4();
    let job = post_job(&state, client_id, Decimal::new(3800, 2)).await;
    let first = shortlisted_applicant(&state, &job, Uuid::new_v4()).await;
    let second = shortlisted_applicant(&state, &job, Uuid::new_v4()).await;

    let (a, b) = tokio::join!(
        state.lifecycle_service.hire(first, client_id, None),
        state.lifecycle_service.hire(second, client_id, None),
    );
    let (winner, loser_err) = match (a, b) {
        (Ok(w), Err(e)) | (Err(e), Ok(w)) => (w, e),
        (Ok(_), Ok(_)) => panic!("both hires succeeded"),
        (Err(e1), Err(e2)) => panic!("both hires failed: {} / {}", e1, e2),
    };
    assert!(matches!(loser_err, Error::JobAlreadyFilled), "got {}", loser_err);

    let contracts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contracts WHERE job_id = $1")
        .bind(job.id)
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(contracts, 1);

    let hired: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM applications WHERE job_id = $1 AND status = 'hired'",
    )
    .bind(job.id)
    .fetch_one(&pool)
    .await
    .expect("count");
    assert_eq!(hired, 1);

    let loser = if winner.application.id == first { second } else { first };
    let loser = state.application_service.get(loser).await.expect("loser");
    assert_eq!(loser.status, "declined");
}

#[tokio::test]
async fn hiring_a_filled_job_fails_without_side_effects() {
    let Some(pool) = test_pool().await else { return };
    let state = state_with(pool.clone(), LifecyclePolicy::default());

    let client_id = Uuid::new_v4();
    let job = post_job(&state, client_id, Decimal::new(4000, 2)).await;
    let first = shortlisted_applicant(&state, &job, Uuid::new_v4()).await;
    assert_ok!(state.lifecycle_service.hire(first, client_id, None).await);

    let late = state.lifecycle_service.hire(first, client_id, None).await;
    assert!(matches!(late, Err(Error::JobAlreadyFilled)));

    let applied_late = state
        .application_service
        .submit(Uuid::new_v4(), job.id, None)
        .await;
    assert!(matches!(applied_late, Err(Error::JobNotOpen)));
}

#[tokio::test]
async fn hire_requires_shortlisting_and_rolls_back() {
    let Some(pool) = test_pool().await else { return };
    let state = state_with(pool.clone(), LifecyclePolicy::default());

    let client_id = Uuid::new_v4();
    let job = post_job(&state, client_id, Decimal::new(4000, 2)).await;
    let app = assert_ok!(
        state
            .application_service
            .submit(Uuid::new_v4(), job.id, None)
            .await
    );

    let err = assert_err!(state.lifecycle_service.hire(app.id, client_id, None).await);
    assert!(matches!(err, Error::InvalidTransition { .. }), "got {}", err);

    // The job close happened inside the failed transaction and must be undone.
    let job = state.job_service.get(job.id).await.expect("job");
    assert_eq!(job.status, "open");
    assert!(state.contract_service.get_for_job(job.id).await.unwrap().is_none());
}

#[tokio::test]
async fn only_the_posting_client_can_hire() {
    let Some(pool) = test_pool().await else { return };
    let state = state_with(pool.clone(), LifecyclePolicy::default());

    let job = post_job(&state, Uuid::new_v4(), Decimal::new(4000, 2)).await;
    let app = shortlisted_applicant(&state, &job, Uuid::new_v4()).await;
    let err = assert_err!(state.lifecycle_service.hire(app, Uuid::new_v4(), None).await);
    assert!(matches!(err, Error::Forbidden(_)));
}

#[tokio::test]
async fn ledger_rules_for_submit_and_withdraw() {
    let Some(pool) = test_pool().await else { return };
    let state = state_with(pool.clone(), LifecyclePolicy::default());

    let client_id = Uuid::new_v4();
    let nurse_id = Uuid::new_v4();
    let job = post_job(&state, client_id, Decimal::new(4200, 2)).await;

    let app = assert_ok!(state.application_service.submit(nurse_id, job.id, None).await);
    let dup = state.application_service.submit(nurse_id, job.id, None).await;
    assert!(matches!(dup, Err(Error::DuplicateApplication)));

    let other = state.application_service.withdraw(app.id, Uuid::new_v4()).await;
    assert!(matches!(other, Err(Error::Forbidden(_))));
    assert_ok!(state.application_service.withdraw(app.id, nurse_id).await);
    assert_ok!(state.application_service.submit(nurse_id, job.id, None).await);

    let declined = shortlisted_applicant(&state, &job, Uuid::new_v4()).await;
    assert_ok!(
        state
            .lifecycle_service
            .transition_application(declined, client_id, ApplicationStatus::Declined, None)
            .await
    );
    let again = state
        .lifecycle_service
        .transition_application(declined, client_id, ApplicationStatus::Declined, None)
        .await;
    assert!(matches!(again, Err(Error::InvalidTransition { .. })));

    let hired_nurse = Uuid::new_v4();
    let hired = shortlisted_applicant(&state, &job, hired_nurse).await;
    assert_ok!(state.lifecycle_service.hire(hired, client_id, None).await);
    let withdraw_hired = state.application_service.withdraw(hired, hired_nurse).await;
    assert!(matches!(withdraw_hired, Err(Error::IllegalWithdraw)));
}

#[tokio::test]
async fn cancelling_a_job_declines_live_applications() {
    let Some(pool) = test_pool().await else { return };
    let state = state_with(pool.clone(), LifecyclePolicy::default());

    let client_id = Uuid::new_v4();
    let job = post_job(&state, client_id, Decimal::new(3900, 2)).await;
    let app = shortlisted_applicant(&state, &job, Uuid::new_v4()).await;

    let (cancelled, declined) = assert_ok!(state.job_service.cancel(job.id, client_id).await);
    assert_eq!(cancelled.status, "cancelled");
    assert_eq!(declined.len(), 1);
    assert_eq!(declined[0].id, app);

    let again = state.job_service.cancel(job.id, client_id).await;
    assert!(matches!(again, Err(Error::JobNotOpen)));
}

#[tokio::test]
async fn contract_terms_are_frozen_and_transitions_forward_only() {
    let Some(pool) = test_pool().await else { return };
    let state = state_with(pool.clone(), LifecyclePolicy::default());

    let contract = active_contract(&state, Decimal::new(5000, 2)).await;
    assert_eq!(contract.status, "active");
    assert!(contract.accepted_at.is_some());

    let reread = state.contract_service.get(contract.id).await.expect("contract");
    assert_eq!(reread.terms_text.as_bytes(), contract.terms_text.as_bytes());

    let tamper = sqlx::query("UPDATE contracts SET terms_text = 'rewritten' WHERE id = $1")
        .bind(contract.id)
        .execute(&pool)
        .await;
    assert!(tamper.is_err());

    let accept_again = state.contract_service.accept(contract.id, contract.nurse_id).await;
    assert!(matches!(accept_again, Err(Error::InvalidTransition { .. })));

    let stranger = state
        .contract_service
        .complete(contract.id, Uuid::new_v4(), PartyRole::Client)
        .await;
    assert!(matches!(stranger, Err(Error::Forbidden(_))));

    let done = assert_ok!(
        state
            .contract_service
            .complete(contract.id, contract.client_id, PartyRole::Client)
            .await
    );
    assert_eq!(done.status, "completed");
    assert_eq!(done.completed_by.as_deref(), Some("client"));

    let twice = state
        .contract_service
        .complete(contract.id, contract.nurse_id, PartyRole::Nurse)
        .await;
    assert!(matches!(twice, Err(Error::NotActive)));
}

#[tokio::test]
async fn transitions_write_audit_entries() {
    let Some(pool) = test_pool().await else { return };
    let state = state_with(pool.clone(), LifecyclePolicy::default());

    let client_id = Uuid::new_v4();
    let job = post_job(&state, client_id, Decimal::new(4100, 2)).await;
    let app = shortlisted_applicant(&state, &job, Uuid::new_v4()).await;
    assert_ok!(state.lifecycle_service.hire(app, client_id, None).await);

    let trail = state
        .audit_service
        .list_for_entity("application", app)
        .await
        .expect("audit");
    let actions: Vec<&str> = trail.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(
        actions,
        vec!["application.submitted", "application.shortlisted", "application.hired"]
    );
}
