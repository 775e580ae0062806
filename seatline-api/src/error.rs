use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use seatline_core::{LedgerError, SeatStatus};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    NotFoundError(String),
    ConflictError { message: String, status: SeatStatus },
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, json!({ "message": msg })),
            AppError::ConflictError { message, status } => (
                StatusCode::CONFLICT,
                json!({ "message": message, "status": status }),
            ),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "message": "Internal Server Error" }))
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::NotFound { label } => {
                AppError::NotFoundError(format!("Seat {} not found.", label))
            }
            LedgerError::Conflict { label, status } => AppError::ConflictError {
                message: conflict_message(&label, status),
                status,
            },
            LedgerError::Storage(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

fn conflict_message(label: &str, status: SeatStatus) -> String {
    match status {
        SeatStatus::Available => format!("Seat {} is not reserved.", label),
        SeatStatus::Reserved => format!("Seat {} is already reserved.", label),
        SeatStatus::Sold => format!("Seat {} is already sold.", label),
    }
}
