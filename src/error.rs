use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("An application for this job already exists")]
    DuplicateApplication,

    #[error("Job is not open")]
    JobNotOpen,

    #[error("Job has already been filled")]
    JobAlreadyFilled,

    #[error("A hired application cannot be withdrawn")]
    IllegalWithdraw,

    #[error("A contract already exists for job {0}")]
    ContractAlreadyExists(Uuid),

    #[error("Invalid transition for {entity}: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("Contract is not active")]
    NotActive,

    #[error("Timecards can only be submitted against an active contract")]
    InactiveContract,

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn invalid_transition(
        entity: &'static str,
        from: impl std::fmt::Display,
        to: impl std::fmt::Display,
    ) -> Self {
        Error::InvalidTransition {
            entity,
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Stable machine-readable code sent alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::BadRequest(_) => "bad_request",
            Error::Unauthorized(_) => "unauthorized",
            Error::Forbidden(_) => "forbidden",
            Error::NotFound(_) => "not_found",
            Error::DuplicateApplication => "duplicate_application",
            Error::JobNotOpen => "job_not_open",
            Error::JobAlreadyFilled => "job_already_filled",
            Error::IllegalWithdraw => "illegal_withdraw",
            Error::ContractAlreadyExists(_) => "contract_already_exists",
            Error::InvalidTransition { .. } => "invalid_transition",
            Error::NotActive => "not_active",
            Error::InactiveContract => "inactive_contract",
            Error::InvalidInterval(_) => "invalid_interval",
            Error::Database(_) => "database_error",
            Error::Validation(_) => "validation_error",
            Error::Json(_) => "invalid_json",
            Error::Reqwest(_) => "upstream_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Business-rule violations are final; only an unavailable store is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Database(
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            )
        )
    }

    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            Error::DuplicateApplication
                | Error::JobNotOpen
                | Error::JobAlreadyFilled
                | Error::IllegalWithdraw
                | Error::ContractAlreadyExists(_)
                | Error::InvalidTransition { .. }
                | Error::NotActive
                | Error::InactiveContract
                | Error::InvalidInterval(_)
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let code = self.code();
        let status = if self.is_business_rule() {
            match self {
                Error::InvalidInterval(_) => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::CONFLICT,
            }
        } else if self.is_transient() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            match self {
                Error::BadRequest(_) | Error::Validation(_) | Error::Json(_) => {
                    StatusCode::BAD_REQUEST
                }
                Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                Error::Forbidden(_) => StatusCode::FORBIDDEN,
                Error::NotFound(_) => StatusCode::NOT_FOUND,
                Error::Reqwest(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
        };

        let error_message = match self {
            Error::Database(ref err) => {
                tracing::error!(error = ?err, "database error");
                "An unexpected error occurred".to_string()
            }
            Error::Internal(ref msg) => {
                tracing::error!(error = %msg, "internal error");
                "An unexpected error occurred".to_string()
            }
            Error::Config(_) => "An unexpected error occurred".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({ "error": error_message, "code": code }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}

/// Name of the violated unique constraint, if `err` is one.
pub fn unique_violation(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            Some(db.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_errors_map_to_conflict() {
        let resp = Error::JobAlreadyFilled.into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = Error::invalid_transition("timecard", "approved", "rejected").into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let resp = Error::InvalidInterval("negative".into()).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn only_store_outages_are_transient() {
        assert!(Error::Database(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!Error::JobAlreadyFilled.is_transient());
        assert!(!Error::Database(sqlx::Error::RowNotFound).is_transient());
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert_eq!(err.code(), "not_found");
    }
}
