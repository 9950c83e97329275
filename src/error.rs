use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tokio_postgres::error::SqlState;

#[derive(Debug, Error)]
pub enum DatabookError {
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("{entity} not found: id={id}")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Persistence failure: {cause}")]
    Persistence { cause: String },
}

/// JSON envelope returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for DatabookError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            DatabookError::Validation { message } => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: message.clone(),
                    details: None,
                },
            ),
            DatabookError::NotFound { entity, id } => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: format!("{} with id {} not found", entity, id),
                    details: None,
                },
            ),
            DatabookError::Conflict { message } => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: message.clone(),
                    details: None,
                },
            ),
            DatabookError::Persistence { cause } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: "storage operation failed".to_string(),
                    details: Some(cause.clone()),
                },
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<tokio_postgres::Error> for DatabookError {
    fn from(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            if db_err.code() == &SqlState::UNIQUE_VIOLATION {
                return DatabookError::Conflict {
                    message: db_err.message().to_string(),
                };
            }
            if db_err.code() == &SqlState::FOREIGN_KEY_VIOLATION {
                return DatabookError::Validation {
                    message: db_err.message().to_string(),
                };
            }
        }
        DatabookError::Persistence {
            cause: err.to_string(),
        }
    }
}

impl From<deadpool_postgres::PoolError> for DatabookError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        DatabookError::Persistence {
            cause: format!("Pool error: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, DatabookError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                DatabookError::Validation {
                    message: "name is required".into(),
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                DatabookError::NotFound {
                    entity: "sidebar item",
                    id: 42,
                },
                StatusCode::NOT_FOUND,
            ),
            (
                DatabookError::Conflict {
                    message: "table name 'customers' is already in use".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                DatabookError::Persistence {
                    cause: "connection reset".into(),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
