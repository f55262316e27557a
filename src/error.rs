use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::{Display, Error};
use serde_json::json;

/// Request-boundary error taxonomy. Every variant renders as a JSON body
/// `{"error": "..."}` with the mapped status; none are fatal to the process.
#[derive(Debug, Display, Error)]
pub enum ApiError {
    #[display(fmt = "Only workers can record attendance")]
    WorkerOnly,

    #[display(fmt = "Access denied")]
    AdminOnly,

    #[display(fmt = "Already checked in")]
    AlreadyCheckedIn,

    #[display(fmt = "No open check-in found")]
    NotCheckedIn,

    #[display(fmt = "{}", _0)]
    Validation(#[error(not(source))] String),

    #[display(fmt = "Internal Server Error")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Database(e)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::WorkerOnly | ApiError::AdminOnly => StatusCode::FORBIDDEN,
            ApiError::AlreadyCheckedIn | ApiError::NotCheckedIn | ApiError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Database(e) = self {
            tracing::error!(error = %e, "Database error");
        }
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
