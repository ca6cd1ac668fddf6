pub mod application_service;
pub mod audit_service;
pub mod contract_service;
pub mod job_service;
pub mod lifecycle_service;
pub mod notification_service;
pub mod payment_service;
pub mod terms_templates;
pub mod timecard_service;
