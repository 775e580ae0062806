use serde::{Deserialize, Serialize};

use crate::models::Seat;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatEventKind {
    Reserved,
    Sold,
    Released,
}

impl SeatEventKind {
    /// SSE event name
    pub fn event_name(&self) -> &'static str {
        match self {
            SeatEventKind::Reserved => "reserved",
            SeatEventKind::Sold => "sold",
            SeatEventKind::Released => "released",
        }
    }
}

/// Emitted after a seat transition has been committed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeatEvent {
    pub kind: SeatEventKind,
    pub seat_id: u32,
    pub label: String,
    pub hold_deadline: Option<i64>,
}

impl SeatEvent {
    pub fn from_seat(kind: SeatEventKind, seat: &Seat) -> Self {
        Self {
            kind,
            seat_id: seat.id,
            label: seat.label.clone(),
            hold_deadline: seat.hold_deadline,
        }
    }
}
