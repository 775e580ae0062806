use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use seatline_core::{SeatStatus, SeatView};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct SeatDetailResponse {
    pub id: u32,
    pub label: String,
    pub status: SeatStatus,
    pub hold_deadline: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReserveResponse {
    pub message: String,
    pub status: SeatStatus,
    pub hold_deadline: i64,
    pub hold_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PurchaseResponse {
    pub message: String,
    pub status: SeatStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/seats", get(list_seats))
        .route("/api/seats/stream", get(crate::stream::seat_stream))
        .route("/api/seats/{label}", get(get_seat))
        .route("/api/seats/{label}/reserve", post(reserve_seat))
        .route("/api/seats/{label}/purchase", post(purchase_seat))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/seats
/// Every seat ordered by id; expired holds are released first
async fn list_seats(State(state): State<AppState>) -> Result<Json<Vec<SeatView>>, AppError> {
    let seats = state.ledger.list_all(state.now()).await?;
    Ok(Json(seats))
}

/// GET /api/seats/{label}
async fn get_seat(
    State(state): State<AppState>,
    Path(label): Path<String>,
) -> Result<Json<SeatDetailResponse>, AppError> {
    let seat = state.ledger.get(&label, state.now()).await?;
    Ok(Json(SeatDetailResponse {
        id: seat.id,
        label: seat.label,
        status: seat.status,
        hold_deadline: seat.hold_deadline,
    }))
}

/// POST /api/seats/{label}/reserve
async fn reserve_seat(
    State(state): State<AppState>,
    Path(label): Path<String>,
) -> Result<Json<ReserveResponse>, AppError> {
    let hold_seconds = state.business_rules.seat_hold_seconds;
    let seat = state.ledger.reserve(&label, state.now(), hold_seconds).await?;

    let hold_deadline = seat
        .hold_deadline
        .ok_or_else(|| AppError::InternalServerError(format!("Reserved seat {} has no deadline", seat.label)))?;

    Ok(Json(ReserveResponse {
        message: format!(
            "Seat {} reserved. You have {} seconds to purchase it.",
            seat.label, hold_seconds
        ),
        status: seat.status,
        hold_deadline,
        hold_seconds,
    }))
}

/// POST /api/seats/{label}/purchase
async fn purchase_seat(
    State(state): State<AppState>,
    Path(label): Path<String>,
) -> Result<Json<PurchaseResponse>, AppError> {
    let seat = state.ledger.purchase(&label).await?;

    Ok(Json(PurchaseResponse {
        message: format!("Purchase complete. Seat {} is sold.", seat.label),
        status: seat.status,
    }))
}
