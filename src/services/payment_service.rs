use crate::error::Result;
use crate::models::event::LifecycleEvent;
use crate::models::payout::Payout;
use crate::models::timecard::Timecard;
use crate::services::notification_service::NotificationService;
use crate::utils::money::split_payment;
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

const PAYOUT_COLUMNS: &str = "id, timecard_id, nurse_id, worked_minutes, hourly_rate, \
     platform_fee_rate, nurse_earnings, platform_fee, total, created_at";

/// Authorizes payment for approved timecards. Money movement itself belongs
/// to the external processor.
#[derive(Clone)]
pub struct PaymentService {
    pool: PgPool,
    outbox: NotificationService,
    payment_url: Option<String>,
    platform_fee_rate: Decimal,
}

impl PaymentService {
    pub fn new(
        pool: PgPool,
        outbox: NotificationService,
        payment_url: Option<String>,
        platform_fee_rate: Decimal,
    ) -> Self {
        Self {
            pool,
            outbox,
            payment_url,
            platform_fee_rate,
        }
    }

    /// Records the payout on the caller's transaction. Returns `None` when
    /// the timecard was already authorized.
    pub(crate) async fn authorize(
        &self,
        conn: &mut PgConnection,
        timecard: &Timecard,
        hourly_rate: Decimal,
    ) -> Result<Option<Payout>> {
        let split = split_payment(timecard.payable_hours(), hourly_rate, self.platform_fee_rate);
        let payout = sqlx::query_as::<_, Payout>(&format!(
            r#"
            INSERT INTO payouts (
                timecard_id, nurse_id, worked_minutes, hourly_rate, platform_fee_rate,
                nurse_earnings, platform_fee, total
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (timecard_id) DO NOTHING
            RETURNING {}
            "#,
            PAYOUT_COLUMNS
        ))
        .bind(timecard.id)
        .bind(timecard.nurse_id)
        .bind(timecard.worked_minutes)
        .bind(hourly_rate)
        .bind(self.platform_fee_rate)
        .bind(split.nurse_earnings)
        .bind(split.platform_fee)
        .bind(split.total)
        .fetch_optional(&mut *conn)
        .await?;
        Ok(payout)
    }

    /// Hands a committed payout to the payment processor. Best effort; the
    /// outbox worker retries delivery.
    pub async fn dispatch(&self, payout: &Payout) {
        let payload = json!({
            "timecard_id": payout.timecard_id,
            "nurse_id": payout.nurse_id,
            "nurse_earnings": payout.nurse_earnings,
            "platform_fee": payout.platform_fee,
            "total": payout.total,
        });
        if self.payment_url.is_none() {
            tracing::warn!(timecard_id = %payout.timecard_id, "no payment endpoint configured, payout recorded only");
        }
        match self
            .outbox
            .enqueue_webhook(self.payment_url.as_deref(), LifecycleEvent::PayoutAuthorized, &payload)
            .await
        {
            Ok(_) => tracing::info!(
                timecard_id = %payout.timecard_id,
                nurse_earnings = %payout.nurse_earnings,
                platform_fee = %payout.platform_fee,
                "payout authorized"
            ),
            Err(e) => tracing::warn!(
                timecard_id = %payout.timecard_id,
                error = %e,
                "failed to enqueue payout request"
            ),
        }
    }

    pub async fn get_for_timecard(&self, timecard_id: Uuid) -> Result<Option<Payout>> {
        let row = sqlx::query_as::<_, Payout>(&format!(
            "SELECT {} FROM payouts WHERE timecard_id = $1",
            PAYOUT_COLUMNS
        ))
        .bind(timecard_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}
