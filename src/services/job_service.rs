use crate::dto::job_dto::CreateJobPayload;
use crate::error::{Error, Result};
use crate::models::application::Application;
use crate::models::care_type::CareType;
use crate::models::event::LifecycleEvent;
use crate::models::job::{JobPosting, JobStatus};
use crate::services::application_service::ApplicationService;
use crate::services::audit_service::AuditService;
use crate::services::notification_service::NotificationService;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

pub(crate) const JOB_COLUMNS: &str = "id, client_id, title, care_type, hourly_rate, location, \
     description, status, filled_at, created_at, updated_at";

#[derive(Clone)]
pub struct JobService {
    pool: PgPool,
    notifications: NotificationService,
}

impl JobService {
    pub fn new(pool: PgPool, notifications: NotificationService) -> Self {
        Self {
            pool,
            notifications,
        }
    }

    pub async fn create(&self, client_id: Uuid, payload: CreateJobPayload) -> Result<JobPosting> {
        let care_type = CareType::from_label(&payload.care_type);
        let mut tx = self.pool.begin().await?;
        let job = sqlx::query_as::<_, JobPosting>(&format!(
            r#"
            INSERT INTO job_postings (client_id, title, care_type, hourly_rate, location, description, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'open')
            RETURNING {}
            "#,
            JOB_COLUMNS
        ))
        .bind(client_id)
        .bind(payload.title.trim())
        .bind(care_type.as_str())
        .bind(payload.hourly_rate)
        .bind(payload.location)
        .bind(payload.description)
        .fetch_one(&mut *tx)
        .await?;

        AuditService::record(
            &mut tx,
            Some(client_id),
            "job.created",
            "job",
            job.id,
            Some(json!({ "care_type": job.care_type, "hourly_rate": job.hourly_rate })),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(job_id = %job.id, client_id = %client_id, "job posted");
        Ok(job)
    }

    pub async fn get(&self, id: Uuid) -> Result<JobPosting> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch(&mut conn, id).await
    }

    pub(crate) async fn fetch(conn: &mut PgConnection, id: Uuid) -> Result<JobPosting> {
        sqlx::query_as::<_, JobPosting>(&format!(
            "SELECT {} FROM job_postings WHERE id = $1",
            JOB_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Job {} not found", id)))
    }

    /// Shared row lock: keeps the job's status stable for the rest of the
    /// transaction. Jobs are always locked before their applications.
    pub(crate) async fn lock_shared(conn: &mut PgConnection, id: Uuid) -> Result<JobPosting> {
        sqlx::query_as::<_, JobPosting>(&format!(
            "SELECT {} FROM job_postings WHERE id = $1 FOR SHARE",
            JOB_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Job {} not found", id)))
    }

    /// Compare-and-swap `open -> to`. `None` means the job was no longer open.
    pub(crate) async fn close_if_open(
        conn: &mut PgConnection,
        id: Uuid,
        to: JobStatus,
    ) -> Result<Option<JobPosting>> {
        let filled_at = if to == JobStatus::Filled { "NOW()" } else { "filled_at" };
        let row = sqlx::query_as::<_, JobPosting>(&format!(
            r#"
            UPDATE job_postings
            SET status = $2, filled_at = {}, updated_at = NOW()
            WHERE id = $1 AND status = 'open'
            RETURNING {}
            "#,
            filled_at, JOB_COLUMNS
        ))
        .bind(id)
        .bind(to.as_str())
        .fetch_optional(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Closes an open job without hiring and declines every live application.
    pub async fn cancel(&self, job_id: Uuid, client_id: Uuid) -> Result<(JobPosting, Vec<Application>)> {
        let mut tx = self.pool.begin().await?;
        let job = Self::fetch(&mut tx, job_id).await?;
        if job.client_id != client_id {
            return Err(Error::Forbidden("Only the posting client can cancel this job".into()));
        }

        let Some(cancelled) = Self::close_if_open(&mut tx, job_id, JobStatus::Cancelled).await? else {
            return Err(Error::JobNotOpen);
        };
        let declined = ApplicationService::decline_live_for_job(&mut tx, job_id, None).await?;
        for application in &declined {
            AuditService::record(
                &mut tx,
                Some(client_id),
                "application.declined",
                "application",
                application.id,
                Some(json!({ "reason": "job_cancelled" })),
            )
            .await?;
        }

        AuditService::record(
            &mut tx,
            Some(client_id),
            "job.cancelled",
            "job",
            job_id,
            Some(json!({ "declined_applications": declined.iter().map(|a| a.id).collect::<Vec<_>>() })),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(job_id = %job_id, declined = declined.len(), "job cancelled");
        self.notifications
            .notify(
                LifecycleEvent::JobCancelled,
                json!({ "job_id": job_id, "client_id": client_id }),
            )
            .await;
        for application in &declined {
            self.notifications
                .notify(
                    LifecycleEvent::ApplicationDeclined,
                    json!({
                        "application_id": application.id,
                        "job_id": job_id,
                        "nurse_id": application.nurse_id,
                        "reason": "job_cancelled",
                    }),
                )
                .await;
        }

        Ok((cancelled, declined))
    }
}
