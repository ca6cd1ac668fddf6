use crate::error::Result;
use crate::models::event::LifecycleEvent;
use crate::models::webhook_log::WebhookLog;
use crate::utils::signature::sign_payload;
use reqwest::Client;
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use std::time::Duration;
use uuid::Uuid;

const WEBHOOK_COLUMNS: &str = "id, event_type, payload, target_url, http_status, response_body, \
     attempts, max_attempts, next_retry_at, status, created_at, updated_at";

/// Outbox for everything leaving the core: notifications and payout
/// requests are stored first and delivered by a background worker.
#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
    client: Client,
    notification_url: Option<String>,
    signing_secret: String,
}

impl NotificationService {
    pub fn new(pool: PgPool, notification_url: Option<String>, signing_secret: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            pool,
            client,
            notification_url,
            signing_secret,
        }
    }

    /// Best effort. A failure here is logged and never reaches the caller,
    /// whose transition has already committed.
    pub async fn notify(&self, event: LifecycleEvent, payload: JsonValue) {
        if self.notification_url.is_none() {
            tracing::debug!(event = %event, "no notification endpoint configured, recording only");
        }
        if let Err(e) = self
            .enqueue_webhook(self.notification_url.as_deref(), event, &payload)
            .await
        {
            tracing::warn!(event = %event, error = %e, "failed to enqueue notification");
        }
    }

    /// Stores an outbound event. Without a `target_url` the row is recorded
    /// as `skipped` and the worker never picks it up.
    pub async fn enqueue_webhook(
        &self,
        target_url: Option<&str>,
        event: LifecycleEvent,
        payload: &JsonValue,
    ) -> Result<WebhookLog> {
        let envelope = json!({
            "event": event.as_str(),
            "data": payload,
        });
        let status = if target_url.is_some() { "pending" } else { "skipped" };
        let row = sqlx::query_as::<_, WebhookLog>(&format!(
            r#"
            INSERT INTO webhook_logs (event_type, payload, target_url, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            WEBHOOK_COLUMNS
        ))
        .bind(event.as_str())
        .bind(envelope)
        .bind(target_url)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn deliver_once(&self, log: &WebhookLog) -> Result<()> {
        let Some(target_url) = log.target_url.as_deref() else {
            sqlx::query(
                "UPDATE webhook_logs SET status = 'skipped', next_retry_at = NULL, updated_at = NOW() WHERE id = $1",
            )
            .bind(log.id)
            .execute(&self.pool)
            .await?;
            return Ok(());
        };
        let body = serde_json::to_vec(&log.payload)?;
        let signature = sign_payload(&self.signing_secret, &body)?;
        let res = self
            .client
            .post(target_url)
            .header("Content-Type", "application/json")
            .header("X-Signature", signature)
            .header("X-Event-Type", &log.event_type)
            .body(body)
            .send()
            .await;

        let (http_status, response_body, delivered) = match res {
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                (Some(i32::from(status.as_u16())), body, status.is_success())
            }
            Err(err) => (None, err.to_string(), false),
        };

        if delivered {
            sqlx::query(
                r#"
                UPDATE webhook_logs
                SET http_status = $1, response_body = $2, status = 'success',
                    attempts = attempts + 1, next_retry_at = NULL, updated_at = NOW()
                WHERE id = $3
                "#,
            )
            .bind(http_status)
            .bind(response_body)
            .bind(log.id)
            .execute(&self.pool)
            .await?;
            return Ok(());
        }

        tracing::warn!(
            webhook_id = %log.id,
            event = %log.event_type,
            attempt = log.attempts + 1,
            http_status = ?http_status,
            "webhook delivery failed"
        );
        sqlx::query(
            r#"
            UPDATE webhook_logs
            SET http_status = $1, response_body = $2,
                attempts = attempts + 1,
                status = CASE WHEN attempts + 1 >= max_attempts THEN 'failed' ELSE 'pending' END,
                next_retry_at = NOW() + make_interval(secs => LEAST(3600, 30 * power(2::float, attempts)::int)),
                updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(http_status)
        .bind(response_body)
        .bind(log.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Claims and delivers one due row. Returns `false` when nothing is due.
    pub async fn run_once(&self) -> Result<bool> {
        // the lease keeps other workers off the row while it is in flight
        let claimed = sqlx::query_as::<_, WebhookLog>(&format!(
            r#"
            UPDATE webhook_logs
            SET next_retry_at = NOW() + INTERVAL '2 minutes', updated_at = NOW()
            WHERE id = (
                SELECT id FROM webhook_logs
                WHERE status = 'pending' AND (next_retry_at IS NULL OR next_retry_at <= NOW())
                ORDER BY created_at ASC
                FOR UPDATE SKIP LOCKED
                LIMIT 1
            )
            RETURNING {}
            "#,
            WEBHOOK_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await?;

        let Some(log) = claimed else { return Ok(false) };
        self.deliver_once(&log).await?;
        Ok(true)
    }

    pub async fn get(&self, id: Uuid) -> Result<WebhookLog> {
        let row = sqlx::query_as::<_, WebhookLog>(&format!(
            "SELECT {} FROM webhook_logs WHERE id = $1",
            WEBHOOK_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }
}
