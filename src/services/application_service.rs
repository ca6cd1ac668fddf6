use crate::error::{unique_violation, Error, Result};
use crate::models::application::{Application, ApplicationStatus};
use crate::models::event::LifecycleEvent;
use crate::models::job::JobStatus;
use crate::services::audit_service::AuditService;
use crate::services::job_service::JobService;
use crate::services::notification_service::NotificationService;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

pub(crate) const APPLICATION_COLUMNS: &str =
    "id, job_id, nurse_id, cover_message, notes, status, created_at, updated_at";

/// The application ledger. Moves to `hired` go through the lifecycle
/// service, which owns the cross-entity cascade.
#[derive(Clone)]
pub struct ApplicationService {
    pool: PgPool,
    notifications: NotificationService,
}

impl ApplicationService {
    pub fn new(pool: PgPool, notifications: NotificationService) -> Self {
        Self {
            pool,
            notifications,
        }
    }

    pub async fn submit(
        &self,
        nurse_id: Uuid,
        job_id: Uuid,
        cover_message: Option<String>,
    ) -> Result<Application> {
        let mut tx = self.pool.begin().await?;
        let job = JobService::lock_shared(&mut tx, job_id).await?;

        let existing: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM applications WHERE job_id = $1 AND nurse_id = $2",
        )
        .bind(job_id)
        .bind(nurse_id)
        .fetch_optional(&mut *tx)
        .await?;
        if existing.is_some() {
            return Err(Error::DuplicateApplication);
        }
        if job.job_status()? != JobStatus::Open {
            return Err(Error::JobNotOpen);
        }

        let application = sqlx::query_as::<_, Application>(&format!(
            r#"
            INSERT INTO applications (job_id, nurse_id, cover_message, status)
            VALUES ($1, $2, $3, 'new')
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(job_id)
        .bind(nurse_id)
        .bind(cover_message)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match unique_violation(&e) {
            Some(_) => Error::DuplicateApplication,
            None => Error::from(e),
        })?;

        AuditService::record(
            &mut tx,
            Some(nurse_id),
            "application.submitted",
            "application",
            application.id,
            Some(json!({ "job_id": job_id })),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(application_id = %application.id, job_id = %job_id, nurse_id = %nurse_id, "application submitted");
        self.notifications
            .notify(
                LifecycleEvent::ApplicationSubmitted,
                json!({
                    "application_id": application.id,
                    "job_id": job_id,
                    "nurse_id": nurse_id,
                    "client_id": job.client_id,
                }),
            )
            .await;

        Ok(application)
    }

    /// Non-hiring moves (`shortlisted`, `declined`) decided by the job's client.
    pub async fn transition(
        &self,
        application_id: Uuid,
        client_id: Uuid,
        new_status: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<Application> {
        if new_status == ApplicationStatus::Hired {
            return Err(Error::Internal(
                "hiring must go through the lifecycle service".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        let job_id = Self::fetch(&mut tx, application_id).await?.job_id;
        let job = JobService::lock_shared(&mut tx, job_id).await?;
        if job.client_id != client_id {
            return Err(Error::Forbidden("Only the posting client can review applications".into()));
        }

        let current = Self::lock(&mut tx, application_id).await?;
        let from = current.application_status()?;
        if !from.can_transition_to(new_status) {
            return Err(Error::invalid_transition("application", from, new_status));
        }
        let updated = Self::set_status(&mut tx, application_id, from, new_status, notes).await?;

        AuditService::record(
            &mut tx,
            Some(client_id),
            &format!("application.{}", new_status),
            "application",
            application_id,
            Some(json!({ "from": from, "to": new_status })),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(application_id = %application_id, from = %from, to = %new_status, "application transitioned");
        if new_status == ApplicationStatus::Declined {
            self.notifications
                .notify(
                    LifecycleEvent::ApplicationDeclined,
                    json!({
                        "application_id": application_id,
                        "job_id": job_id,
                        "nurse_id": updated.nurse_id,
                    }),
                )
                .await;
        }

        Ok(updated)
    }

    /// Removes the nurse's application. Hired applications stay put.
    pub async fn withdraw(&self, application_id: Uuid, nurse_id: Uuid) -> Result<Application> {
        let mut tx = self.pool.begin().await?;
        let snapshot = Self::fetch(&mut tx, application_id).await?;
        if snapshot.nurse_id != nurse_id {
            return Err(Error::Forbidden("Only the applicant can withdraw an application".into()));
        }
        JobService::lock_shared(&mut tx, snapshot.job_id).await?;

        let current = Self::lock(&mut tx, application_id).await?;
        if current.application_status()? == ApplicationStatus::Hired {
            return Err(Error::IllegalWithdraw);
        }

        sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(application_id)
            .execute(&mut *tx)
            .await?;
        AuditService::record(
            &mut tx,
            Some(nurse_id),
            "application.withdrawn",
            "application",
            application_id,
            Some(json!({ "job_id": current.job_id, "status": current.status })),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(application_id = %application_id, nurse_id = %nurse_id, "application withdrawn");
        Ok(current)
    }

    pub async fn get(&self, id: Uuid) -> Result<Application> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch(&mut conn, id).await
    }

    pub async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<Application>> {
        let rows = sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE job_id = $1 ORDER BY created_at ASC",
            APPLICATION_COLUMNS
        ))
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_for_nurse(&self, nurse_id: Uuid) -> Result<Vec<Application>> {
        let rows = sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE nurse_id = $1 ORDER BY created_at DESC",
            APPLICATION_COLUMNS
        ))
        .bind(nurse_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub(crate) async fn fetch(conn: &mut PgConnection, id: Uuid) -> Result<Application> {
        sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE id = $1",
            APPLICATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Application {} not found", id)))
    }

    pub(crate) async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<Application> {
        sqlx::query_as::<_, Application>(&format!(
            "SELECT {} FROM applications WHERE id = $1 FOR UPDATE",
            APPLICATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Application {} not found", id)))
    }

    /// Conditional on the row still being in `from`.
    pub(crate) async fn set_status(
        conn: &mut PgConnection,
        id: Uuid,
        from: ApplicationStatus,
        to: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<Application> {
        sqlx::query_as::<_, Application>(&format!(
            r#"
            UPDATE applications
            SET status = $3, notes = COALESCE($4, notes), updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(notes)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::invalid_transition("application", from, to))
    }

    /// Declines every `new`/`shortlisted` application of the job, optionally
    /// sparing one.
    pub(crate) async fn decline_live_for_job(
        conn: &mut PgConnection,
        job_id: Uuid,
        except: Option<Uuid>,
    ) -> Result<Vec<Application>> {
        let rows = sqlx::query_as::<_, Application>(&format!(
            r#"
            UPDATE applications
            SET status = 'declined', updated_at = NOW()
            WHERE job_id = $1
              AND status IN ('new', 'shortlisted')
              AND ($2::uuid IS NULL OR id <> $2)
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(job_id)
        .bind(except)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }
}
