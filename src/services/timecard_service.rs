use crate::error::{Error, Result};
use crate::models::contract::{ContractStatus, PartyRole};
use crate::models::event::LifecycleEvent;
use crate::models::payout::Payout;
use crate::models::timecard::{Timecard, TimecardStatus};
use crate::services::audit_service::AuditService;
use crate::services::contract_service::ContractService;
use crate::services::notification_service::NotificationService;
use crate::services::payment_service::PaymentService;
use crate::utils::time::{
    compute_shift_hours, ensure_recent_shift_date, round_to_quarter_hour, shift_bounds,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

pub(crate) const TIMECARD_COLUMNS: &str = "id, contract_id, job_id, nurse_id, client_id, shift_date, \
     start_at, end_at, rounded_start_at, rounded_end_at, break_minutes, is_overnight, \
     worked_minutes, total_hours, notes, status, rejection_reason, decided_by, decided_at, \
     paid_at, timestamp_submitted, approval_deadline, created_at, updated_at";

const SWEEP_BATCH: i64 = 500;

#[derive(Debug, Clone)]
pub struct TimecardSubmission {
    pub shift_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_minutes: i64,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct TimecardService {
    pool: PgPool,
    notifications: NotificationService,
    payments: PaymentService,
    review_window: Duration,
    max_shift_hours: i64,
}

impl TimecardService {
    pub fn new(
        pool: PgPool,
        notifications: NotificationService,
        payments: PaymentService,
        review_window: Duration,
        max_shift_hours: i64,
    ) -> Self {
        Self {
            pool,
            notifications,
            payments,
            review_window,
            max_shift_hours,
        }
    }

    pub async fn submit(
        &self,
        contract_id: Uuid,
        nurse_id: Uuid,
        submission: TimecardSubmission,
    ) -> Result<Timecard> {
        let mut tx = self.pool.begin().await?;
        let contract = ContractService::lock_shared(&mut tx, contract_id).await?;
        if contract.party_role(nurse_id) != Some(PartyRole::Nurse) {
            return Err(Error::Forbidden("Only the contracted nurse can submit timecards".into()));
        }
        if contract.contract_status()? != ContractStatus::Active {
            return Err(Error::InactiveContract);
        }

        let shift = compute_shift_hours(
            submission.start_time,
            submission.end_time,
            submission.break_minutes,
        )?;
        shift.ensure_within(self.max_shift_hours)?;
        let submitted_at = Utc::now();
        ensure_recent_shift_date(submission.shift_date, submitted_at.date_naive())?;
        let (start_at, end_at) = shift_bounds(
            submission.shift_date,
            submission.start_time,
            submission.end_time,
            shift.is_overnight,
        )?;

        let deadline = submitted_at + self.review_window;

        let timecard = sqlx::query_as::<_, Timecard>(&format!(
            r#"
            INSERT INTO timecards (
                contract_id, job_id, nurse_id, client_id, shift_date, start_at, end_at,
                rounded_start_at, rounded_end_at, break_minutes, is_overnight, worked_minutes,
                total_hours, notes, status, timestamp_submitted, approval_deadline
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, 'submitted', $15, $16)
            RETURNING {}
            "#,
            TIMECARD_COLUMNS
        ))
        .bind(contract.id)
        .bind(contract.job_id)
        .bind(contract.nurse_id)
        .bind(contract.client_id)
        .bind(submission.shift_date)
        .bind(start_at)
        .bind(end_at)
        .bind(round_to_quarter_hour(start_at))
        .bind(round_to_quarter_hour(end_at))
        .bind(submission.break_minutes as i32)
        .bind(shift.is_overnight)
        .bind(shift.worked_minutes as i32)
        .bind(shift.total_hours())
        .bind(submission.notes)
        .bind(submitted_at)
        .bind(deadline)
        .fetch_one(&mut *tx)
        .await?;

        AuditService::record(
            &mut tx,
            Some(nurse_id),
            "timecard.submitted",
            "timecard",
            timecard.id,
            Some(json!({
                "contract_id": contract_id,
                "worked_minutes": timecard.worked_minutes,
                "is_overnight": timecard.is_overnight,
            })),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(
            timecard_id = %timecard.id,
            contract_id = %contract_id,
            total_hours = %timecard.total_hours,
            overnight = timecard.is_overnight,
            "timecard submitted"
        );
        self.notifications
            .notify(
                LifecycleEvent::TimecardSubmitted,
                json!({
                    "timecard_id": timecard.id,
                    "contract_id": contract_id,
                    "client_id": timecard.client_id,
                    "total_hours": timecard.total_hours,
                    "approval_deadline": timecard.approval_deadline,
                }),
            )
            .await;

        Ok(timecard)
    }

    pub async fn approve(&self, timecard_id: Uuid, approver_id: Uuid) -> Result<Timecard> {
        let (timecard, payout) = self
            .decide(timecard_id, approver_id, TimecardStatus::Approved, None)
            .await?;

        self.notifications
            .notify(
                LifecycleEvent::TimecardApproved,
                json!({
                    "timecard_id": timecard.id,
                    "contract_id": timecard.contract_id,
                    "nurse_id": timecard.nurse_id,
                    "total_hours": timecard.total_hours,
                }),
            )
            .await;
        if let Some(payout) = payout {
            self.payments.dispatch(&payout).await;
        }
        Ok(timecard)
    }

    /// Disputes a timecard. A non-blank reason is mandatory.
    pub async fn reject(&self, timecard_id: Uuid, approver_id: Uuid, reason: &str) -> Result<Timecard> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(Error::BadRequest("A rejection reason is required".into()));
        }
        let (timecard, _) = self
            .decide(
                timecard_id,
                approver_id,
                TimecardStatus::Rejected,
                Some(reason.to_string()),
            )
            .await?;

        self.notifications
            .notify(
                LifecycleEvent::TimecardRejected,
                json!({
                    "timecard_id": timecard.id,
                    "contract_id": timecard.contract_id,
                    "nurse_id": timecard.nurse_id,
                    "reason": timecard.rejection_reason,
                }),
            )
            .await;
        Ok(timecard)
    }

    async fn decide(
        &self,
        timecard_id: Uuid,
        approver_id: Uuid,
        to: TimecardStatus,
        reason: Option<String>,
    ) -> Result<(Timecard, Option<Payout>)> {
        let mut tx = self.pool.begin().await?;
        let current = Self::fetch(&mut tx, timecard_id).await?;
        if current.client_id != approver_id {
            return Err(Error::Forbidden("Only the contract's client can review timecards".into()));
        }
        let from = current.timecard_status()?;
        if !from.can_transition_to(to) {
            return Err(Error::invalid_transition("timecard", from, to));
        }

        let updated = sqlx::query_as::<_, Timecard>(&format!(
            r#"
            UPDATE timecards
            SET status = $2, rejection_reason = $3, decided_by = $4, decided_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'submitted'
            RETURNING {}
            "#,
            TIMECARD_COLUMNS
        ))
        .bind(timecard_id)
        .bind(to.as_str())
        .bind(reason)
        .bind(approver_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(updated) = updated else {
            let latest = Self::fetch(&mut tx, timecard_id).await?;
            return Err(Error::invalid_transition("timecard", latest.status, to));
        };

        let payout = if to.is_payable() {
            let rate = Self::contract_rate(&mut tx, updated.contract_id).await?;
            self.payments.authorize(&mut tx, &updated, rate).await?
        } else {
            None
        };

        AuditService::record(
            &mut tx,
            Some(approver_id),
            &format!("timecard.{}", to),
            "timecard",
            timecard_id,
            Some(json!({ "from": from, "to": to, "reason": updated.rejection_reason })),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(timecard_id = %timecard_id, status = %to, "timecard reviewed");
        Ok((updated, payout))
    }

    /// Auto-approves every `submitted` timecard whose review deadline is at or
    /// before `now`. Safe to run concurrently and repeatedly: each row moves
    /// only while still `submitted`, and rows locked by a manual review are
    /// left for that review to settle.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<Vec<Timecard>> {
        let mut swept = Vec::new();
        loop {
            let mut tx = self.pool.begin().await?;
            let batch = sqlx::query_as::<_, Timecard>(&format!(
                r#"
                UPDATE timecards
                SET status = 'auto_approved', decided_at = $1, updated_at = NOW()
                WHERE id IN (
                    SELECT id FROM timecards
                    WHERE status = 'submitted' AND approval_deadline <= $1
                    ORDER BY approval_deadline ASC
                    LIMIT $2
                    FOR UPDATE SKIP LOCKED
                )
                AND status = 'submitted'
                RETURNING {}
                "#,
                TIMECARD_COLUMNS
            ))
            .bind(now)
            .bind(SWEEP_BATCH)
            .fetch_all(&mut *tx)
            .await?;

            if batch.is_empty() {
                tx.rollback().await?;
                break;
            }

            let mut payouts = Vec::with_capacity(batch.len());
            for timecard in &batch {
                let rate = Self::contract_rate(&mut tx, timecard.contract_id).await?;
                if let Some(payout) = self.payments.authorize(&mut tx, timecard, rate).await? {
                    payouts.push(payout);
                }
                AuditService::record(
                    &mut tx,
                    None,
                    "timecard.auto_approved",
                    "timecard",
                    timecard.id,
                    Some(json!({ "approval_deadline": timecard.approval_deadline, "swept_at": now })),
                )
                .await?;
            }
            tx.commit().await?;

            for timecard in &batch {
                self.notifications
                    .notify(
                        LifecycleEvent::TimecardAutoApproved,
                        json!({
                            "timecard_id": timecard.id,
                            "contract_id": timecard.contract_id,
                            "nurse_id": timecard.nurse_id,
                            "client_id": timecard.client_id,
                            "approval_deadline": timecard.approval_deadline,
                        }),
                    )
                    .await;
            }
            for payout in &payouts {
                self.payments.dispatch(payout).await;
            }

            let full = batch.len() as i64 == SWEEP_BATCH;
            swept.extend(batch);
            if !full {
                break;
            }
        }

        if swept.is_empty() {
            tracing::debug!(now = %now, "timecard sweep found nothing due");
        } else {
            tracing::info!(count = swept.len(), now = %now, "timecards auto-approved");
        }
        Ok(swept)
    }

    /// Called once the payment processor reports settlement.
    pub async fn mark_paid(&self, timecard_id: Uuid) -> Result<Timecard> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_as::<_, Timecard>(&format!(
            r#"
            UPDATE timecards
            SET status = 'paid', paid_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status IN ('approved', 'auto_approved')
            RETURNING {}
            "#,
            TIMECARD_COLUMNS
        ))
        .bind(timecard_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(updated) = updated else {
            let current = Self::fetch(&mut tx, timecard_id).await?;
            return Err(Error::invalid_transition("timecard", current.status, TimecardStatus::Paid));
        };

        AuditService::record(&mut tx, None, "timecard.paid", "timecard", timecard_id, None).await?;
        tx.commit().await?;

        tracing::info!(timecard_id = %timecard_id, "timecard paid");
        self.notifications
            .notify(
                LifecycleEvent::TimecardPaid,
                json!({ "timecard_id": timecard_id, "nurse_id": updated.nurse_id }),
            )
            .await;
        Ok(updated)
    }

    pub async fn get(&self, id: Uuid) -> Result<Timecard> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch(&mut conn, id).await
    }

    pub async fn list_for_contract(&self, contract_id: Uuid) -> Result<Vec<Timecard>> {
        let rows = sqlx::query_as::<_, Timecard>(&format!(
            "SELECT {} FROM timecards WHERE contract_id = $1 ORDER BY start_at ASC",
            TIMECARD_COLUMNS
        ))
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn fetch(conn: &mut PgConnection, id: Uuid) -> Result<Timecard> {
        sqlx::query_as::<_, Timecard>(&format!(
            "SELECT {} FROM timecards WHERE id = $1",
            TIMECARD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Timecard {} not found", id)))
    }

    async fn contract_rate(conn: &mut PgConnection, contract_id: Uuid) -> Result<Decimal> {
        let rate: Decimal = sqlx::query_scalar("SELECT hourly_rate FROM contracts WHERE id = $1")
            .bind(contract_id)
            .fetch_one(&mut *conn)
            .await?;
        Ok(rate)
    }
}
