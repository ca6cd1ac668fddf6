use crate::error::{unique_violation, Error, Result};
use crate::models::application::Application;
use crate::models::care_type::CareType;
use crate::models::contract::{Contract, ContractStatus, PartyRole};
use crate::models::event::LifecycleEvent;
use crate::models::job::JobPosting;
use crate::services::audit_service::AuditService;
use crate::services::notification_service::NotificationService;
use crate::services::terms_templates::{render_terms, template_for, TermsContext};
use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

pub(crate) const CONTRACT_COLUMNS: &str = "id, job_id, application_id, nurse_id, client_id, care_type, \
     terms_text, hourly_rate, rate_guidance_min, rate_guidance_max, status, accepted_at, \
     completed_at, completed_by, created_at, updated_at";

#[derive(Clone)]
pub struct ContractService {
    pool: PgPool,
    notifications: NotificationService,
    review_window: Duration,
}

impl ContractService {
    pub fn new(pool: PgPool, notifications: NotificationService, review_window: Duration) -> Self {
        Self {
            pool,
            notifications,
            review_window,
        }
    }

    /// Creates the `pending` contract for a freshly hired application, on the
    /// caller's transaction.
    pub(crate) async fn issue(
        &self,
        conn: &mut PgConnection,
        application: &Application,
        job: &JobPosting,
        issued_at: DateTime<Utc>,
    ) -> Result<Contract> {
        let existing: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM contracts WHERE job_id = $1")
                .bind(job.id)
                .fetch_optional(&mut *conn)
                .await?;
        if existing.is_some() {
            return Err(Error::ContractAlreadyExists(job.id));
        }

        let care_type = CareType::from_label(&job.care_type);
        let template = template_for(care_type);
        let terms_text = render_terms(
            template,
            &TermsContext {
                job_id: job.id,
                job_title: &job.title,
                client_id: job.client_id,
                nurse_id: application.nurse_id,
                hourly_rate: job.hourly_rate,
                review_window_hours: self.review_window.num_hours(),
                issued_on: issued_at.date_naive(),
            },
        );
        let (rate_min, rate_max) = template.rate_guidance();

        let contract = sqlx::query_as::<_, Contract>(&format!(
            r#"
            INSERT INTO contracts (
                job_id, application_id, nurse_id, client_id, care_type, terms_text,
                hourly_rate, rate_guidance_min, rate_guidance_max, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending', $10, $10)
            RETURNING {}
            "#,
            CONTRACT_COLUMNS
        ))
        .bind(job.id)
        .bind(application.id)
        .bind(application.nurse_id)
        .bind(job.client_id)
        .bind(care_type.as_str())
        .bind(&terms_text)
        .bind(job.hourly_rate)
        .bind(rate_min)
        .bind(rate_max)
        .bind(issued_at)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(_) => Error::ContractAlreadyExists(job.id),
            None => Error::from(e),
        })?;

        AuditService::record(
            conn,
            Some(job.client_id),
            "contract.issued",
            "contract",
            contract.id,
            Some(json!({ "job_id": job.id, "application_id": application.id, "care_type": care_type })),
        )
        .await?;

        Ok(contract)
    }

    pub async fn accept(&self, contract_id: Uuid, nurse_id: Uuid) -> Result<Contract> {
        let contract = self.get(contract_id).await?;
        if contract.party_role(nurse_id) != Some(PartyRole::Nurse) {
            return Err(Error::Forbidden("Only the contracted nurse can accept".into()));
        }
        let from = contract.contract_status()?;
        if !from.can_transition_to(ContractStatus::Active) {
            return Err(Error::invalid_transition("contract", from, ContractStatus::Active));
        }

        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_as::<_, Contract>(&format!(
            r#"
            UPDATE contracts
            SET status = 'active', accepted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING {}
            "#,
            CONTRACT_COLUMNS
        ))
        .bind(contract_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(updated) = updated else {
            let current = Self::fetch(&mut tx, contract_id).await?;
            return Err(Error::invalid_transition(
                "contract",
                current.status,
                ContractStatus::Active,
            ));
        };

        AuditService::record(&mut tx, Some(nurse_id), "contract.accepted", "contract", contract_id, None)
            .await?;
        tx.commit().await?;

        tracing::info!(contract_id = %contract_id, "contract accepted");
        self.notifications
            .notify(
                LifecycleEvent::ContractAccepted,
                json!({ "contract_id": contract_id, "job_id": updated.job_id, "client_id": updated.client_id }),
            )
            .await;
        Ok(updated)
    }

    /// `active -> completed`, requested by either party. Terminal.
    pub async fn complete(
        &self,
        contract_id: Uuid,
        requestor_id: Uuid,
        requestor_role: PartyRole,
    ) -> Result<Contract> {
        let contract = self.get(contract_id).await?;
        if contract.party_role(requestor_id) != Some(requestor_role) {
            return Err(Error::Forbidden("Only a party to the contract can complete it".into()));
        }

        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_as::<_, Contract>(&format!(
            r#"
            UPDATE contracts
            SET status = 'completed', completed_at = NOW(), completed_by = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'active'
            RETURNING {}
            "#,
            CONTRACT_COLUMNS
        ))
        .bind(contract_id)
        .bind(requestor_role.as_str())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(updated) = updated else {
            return Err(Error::NotActive);
        };

        AuditService::record(
            &mut tx,
            Some(requestor_id),
            "contract.completed",
            "contract",
            contract_id,
            Some(json!({ "completed_by": requestor_role })),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(contract_id = %contract_id, completed_by = %requestor_role, "contract completed");
        self.notifications
            .notify(
                LifecycleEvent::ContractCompleted,
                json!({
                    "contract_id": contract_id,
                    "job_id": updated.job_id,
                    "nurse_id": updated.nurse_id,
                    "client_id": updated.client_id,
                    "completed_by": requestor_role,
                }),
            )
            .await;
        Ok(updated)
    }

    pub async fn get(&self, id: Uuid) -> Result<Contract> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch(&mut conn, id).await
    }

    pub async fn get_for_job(&self, job_id: Uuid) -> Result<Option<Contract>> {
        let row = sqlx::query_as::<_, Contract>(&format!(
            "SELECT {} FROM contracts WHERE job_id = $1",
            CONTRACT_COLUMNS
        ))
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub(crate) async fn fetch(conn: &mut PgConnection, id: Uuid) -> Result<Contract> {
        sqlx::query_as::<_, Contract>(&format!(
            "SELECT {} FROM contracts WHERE id = $1",
            CONTRACT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Contract {} not found", id)))
    }

    /// Shared lock so the contract cannot complete while a timecard is filed.
    pub(crate) async fn lock_shared(conn: &mut PgConnection, id: Uuid) -> Result<Contract> {
        sqlx::query_as::<_, Contract>(&format!(
            "SELECT {} FROM contracts WHERE id = $1 FOR SHARE",
            CONTRACT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Contract {} not found", id)))
    }
}
