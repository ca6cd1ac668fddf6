use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus};
use crate::models::contract::Contract;
use crate::models::event::LifecycleEvent;
use crate::models::job::JobStatus;
use crate::models::timecard::Timecard;
use crate::services::application_service::ApplicationService;
use crate::services::audit_service::AuditService;
use crate::services::contract_service::ContractService;
use crate::services::job_service::JobService;
use crate::services::notification_service::NotificationService;
use crate::services::timecard_service::TimecardService;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

/// Outcome of a successful hire.
#[derive(Debug, Clone, Serialize)]
pub struct HireOutcome {
    pub application: Application,
    pub contract: Contract,
    pub declined: Vec<Uuid>,
}

/// Outcome of any application transition requested by a client.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum TransitionOutcome {
    Hired(HireOutcome),
    Updated(Application),
}

/// Composes the ledger, the contract issuer and the timecard pipeline behind
/// transactional boundaries.
#[derive(Clone)]
pub struct LifecycleService {
    pool: PgPool,
    applications: ApplicationService,
    contracts: ContractService,
    timecards: TimecardService,
    notifications: NotificationService,
}

impl LifecycleService {
    pub fn new(
        pool: PgPool,
        applications: ApplicationService,
        contracts: ContractService,
        timecards: TimecardService,
        notifications: NotificationService,
    ) -> Self {
        Self {
            pool,
            applications,
            contracts,
            timecards,
            notifications,
        }
    }

    pub async fn transition_application(
        &self,
        application_id: Uuid,
        client_id: Uuid,
        new_status: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<TransitionOutcome> {
        match new_status {
            ApplicationStatus::Hired => self
                .hire(application_id, client_id, notes)
                .await
                .map(TransitionOutcome::Hired),
            other => self
                .applications
                .transition(application_id, client_id, other, notes)
                .await
                .map(TransitionOutcome::Updated),
        }
    }

    /// Hires one applicant. In a single transaction: the job moves
    /// `open -> filled` by compare-and-swap, the application becomes `hired`,
    /// every other live application is declined and a pending contract is
    /// issued. Any failure rolls all of it back.
    pub async fn hire(
        &self,
        application_id: Uuid,
        client_id: Uuid,
        notes: Option<String>,
    ) -> Result<HireOutcome> {
        let mut tx = self.pool.begin().await?;

        let snapshot = ApplicationService::fetch(&mut tx, application_id).await?;
        let job = JobService::fetch(&mut tx, snapshot.job_id).await?;
        if job.client_id != client_id {
            return Err(Error::Forbidden("Only the posting client can hire for this job".into()));
        }

        // The loser of a concurrent hire stops here, before touching any application.
        let Some(job) = JobService::close_if_open(&mut tx, job.id, JobStatus::Filled).await? else {
            tracing::info!(job_id = %snapshot.job_id, application_id = %application_id, "hire lost: job no longer open");
            return Err(Error::JobAlreadyFilled);
        };

        let current = ApplicationService::lock(&mut tx, application_id).await?;
        let from = current.application_status()?;
        if !from.can_transition_to(ApplicationStatus::Hired) {
            return Err(Error::invalid_transition("application", from, ApplicationStatus::Hired));
        }
        let hired =
            ApplicationService::set_status(&mut tx, application_id, from, ApplicationStatus::Hired, notes)
                .await?;
        let declined =
            ApplicationService::decline_live_for_job(&mut tx, job.id, Some(application_id)).await?;

        for application in &declined {
            AuditService::record(
                &mut tx,
                Some(client_id),
                "application.declined",
                "application",
                application.id,
                Some(json!({ "reason": "position_filled", "hired_application_id": application_id })),
            )
            .await?;
        }

        let issued_at = job.filled_at.unwrap_or_else(Utc::now);
        let contract = self.contracts.issue(&mut tx, &hired, &job, issued_at).await?;

        AuditService::record(
            &mut tx,
            Some(client_id),
            "application.hired",
            "application",
            application_id,
            Some(json!({
                "job_id": job.id,
                "contract_id": contract.id,
                "declined": declined.iter().map(|a| a.id).collect::<Vec<_>>(),
            })),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            job_id = %job.id,
            application_id = %application_id,
            contract_id = %contract.id,
            declined = declined.len(),
            "applicant hired"
        );

        self.notifications
            .notify(
                LifecycleEvent::ApplicationHired,
                json!({
                    "application_id": application_id,
                    "job_id": job.id,
                    "nurse_id": hired.nurse_id,
                    "contract_id": contract.id,
                }),
            )
            .await;
        for application in &declined {
            self.notifications
                .notify(
                    LifecycleEvent::ApplicationDeclined,
                    json!({
                        "application_id": application.id,
                        "job_id": job.id,
                        "nurse_id": application.nurse_id,
                        "reason": "position_filled",
                    }),
                )
                .await;
        }
        self.notifications
            .notify(
                LifecycleEvent::ContractIssued,
                json!({
                    "contract_id": contract.id,
                    "job_id": job.id,
                    "nurse_id": contract.nurse_id,
                    "client_id": contract.client_id,
                }),
            )
            .await;

        Ok(HireOutcome {
            application: hired,
            contract,
            declined: declined.into_iter().map(|a| a.id).collect(),
        })
    }

    /// One pass of the auto-approval sweep. Errors are logged and swallowed:
    /// the next tick retries whatever is still due.
    pub async fn run_sweep(&self, now: DateTime<Utc>) -> Vec<Timecard> {
        match self.timecards.sweep_expired(now).await {
            Ok(swept) => swept,
            Err(e) if e.is_transient() => {
                tracing::warn!(error = %e, "timecard sweep skipped: store unavailable");
                Vec::new()
            }
            Err(e) => {
                tracing::error!(error = %e, "timecard sweep failed");
                Vec::new()
            }
        }
    }
}
