pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use crate::config::{Config, LifecyclePolicy};
use crate::services::{
    application_service::ApplicationService, audit_service::AuditService,
    contract_service::ContractService, job_service::JobService,
    lifecycle_service::LifecycleService, notification_service::NotificationService,
    payment_service::PaymentService, timecard_service::TimecardService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub jwt_secret: String,
    pub webhook_secret: String,
    pub policy: LifecyclePolicy,
    pub notification_service: NotificationService,
    pub audit_service: AuditService,
    pub job_service: JobService,
    pub application_service: ApplicationService,
    pub contract_service: ContractService,
    pub payment_service: PaymentService,
    pub timecard_service: TimecardService,
    pub lifecycle_service: LifecycleService,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Self {
        let policy = config.policy.clone();
        let notification_service = NotificationService::new(
            pool.clone(),
            config.notification_webhook_url.clone(),
            config.webhook_secret.clone(),
        );
        let audit_service = AuditService::new(pool.clone());
        let job_service = JobService::new(pool.clone(), notification_service.clone());
        let application_service =
            ApplicationService::new(pool.clone(), notification_service.clone());
        let contract_service = ContractService::new(
            pool.clone(),
            notification_service.clone(),
            policy.review_window,
        );
        let payment_service = PaymentService::new(
            pool.clone(),
            notification_service.clone(),
            config.payment_webhook_url.clone(),
            policy.platform_fee_rate,
        );
        let timecard_service = TimecardService::new(
            pool.clone(),
            notification_service.clone(),
            payment_service.clone(),
            policy.review_window,
            policy.max_shift_hours,
        );
        let lifecycle_service = LifecycleService::new(
            pool.clone(),
            application_service.clone(),
            contract_service.clone(),
            timecard_service.clone(),
            notification_service.clone(),
        );

        Self {
            pool,
            jwt_secret: config.jwt_secret.clone(),
            webhook_secret: config.webhook_secret.clone(),
            policy,
            notification_service,
            audit_service,
            job_service,
            application_service,
            contract_service,
            payment_service,
            timecard_service,
            lifecycle_service,
        }
    }
}
