//! Hold expiry policy.
//!
//! Pure functions of a seat and the caller's clock value; the ledger calls
//! them before touching any seat.

use crate::models::{Seat, SeatStatus};

/// A hold is void once `now` is strictly past its deadline.
pub fn is_expired(seat: &Seat, now: i64) -> bool {
    match (seat.status, seat.hold_deadline) {
        (SeatStatus::Reserved, Some(deadline)) => deadline < now,
        _ => false,
    }
}

pub fn deadline_for(now: i64, hold_seconds: u64) -> i64 {
    let hold = i64::try_from(hold_seconds).unwrap_or(i64::MAX);
    now.saturating_add(hold)
}
