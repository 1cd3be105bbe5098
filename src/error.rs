use crate::engine::LifecycleError;
use crate::orchestration::ServiceError;
use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    Internal(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AppError::NotFound(err.to_string()),
            StoreError::Conflict(_) | StoreError::Duplicate(_) => AppError::Conflict(err.to_string()),
            StoreError::Database(_) | StoreError::Corrupt(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(_) => AppError::NotFound(err.to_string()),
            ServiceError::InvalidInput(_) => AppError::BadRequest(err.to_string()),
            ServiceError::DuplicateTransaction(_) | ServiceError::Finalized(_) => {
                AppError::Conflict(err.to_string())
            }
            ServiceError::Lifecycle(e) => match e {
                LifecycleError::InvalidState { .. } => AppError::Conflict(e.to_string()),
                LifecycleError::InvalidAmount(_)
                | LifecycleError::InvalidApy(_)
                | LifecycleError::NoRewardsAvailable
                | LifecycleError::ClaimExceedsPending { .. } => AppError::BadRequest(e.to_string()),
            },
            ServiceError::Store(e) => e.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Decimal, PositionStatus};

    fn status_of(err: ServiceError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn test_lifecycle_errors_map_to_client_statuses() {
        assert_eq!(
            status_of(LifecycleError::InvalidAmount(Decimal::zero()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(LifecycleError::NoRewardsAvailable.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(
                LifecycleError::InvalidState {
                    operation: "claim",
                    status: PositionStatus::Completed,
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_store_errors_map_by_kind() {
        assert_eq!(
            status_of(StoreError::Conflict("position".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(StoreError::Corrupt("bad row".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ServiceError::NotFound("position".into())),
            StatusCode::NOT_FOUND
        );
    }
}
