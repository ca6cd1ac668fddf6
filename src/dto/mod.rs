pub mod application_dto;
pub mod contract_dto;
pub mod job_dto;
pub mod timecard_dto;
pub mod webhook_dto;
