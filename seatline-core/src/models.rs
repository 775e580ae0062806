use serde::{Deserialize, Serialize};
use std::fmt;

/// Seat status in the reservation lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    Reserved,
    Sold,
}

impl SeatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SeatStatus::Available => "AVAILABLE",
            SeatStatus::Reserved => "RESERVED",
            SeatStatus::Sold => "SOLD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AVAILABLE" => Some(SeatStatus::Available),
            "RESERVED" => Some(SeatStatus::Reserved),
            "SOLD" => Some(SeatStatus::Sold),
            _ => None,
        }
    }
}

impl fmt::Display for SeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of inventory.
///
/// `hold_deadline` is a unix timestamp (seconds) and is `Some` exactly when the
/// seat is `Reserved`. Status and deadline only change together through the
/// transition helpers below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub id: u32,
    pub label: String,
    pub status: SeatStatus,
    pub hold_deadline: Option<i64>,
}

impl Seat {
    pub fn new(id: u32, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            status: SeatStatus::Available,
            hold_deadline: None,
        }
    }

    /// Transition: Available → Reserved
    pub fn hold_until(&mut self, deadline: i64) {
        self.status = SeatStatus::Reserved;
        self.hold_deadline = Some(deadline);
    }

    /// Transition: Reserved → Sold
    pub fn mark_sold(&mut self) {
        self.status = SeatStatus::Sold;
        self.hold_deadline = None;
    }

    /// Transition: Reserved → Available (hold expired)
    pub fn release(&mut self) {
        self.status = SeatStatus::Available;
        self.hold_deadline = None;
    }

    pub fn view(&self) -> SeatView {
        SeatView {
            id: self.id,
            label: self.label.clone(),
            status: self.status,
        }
    }
}

/// Listing projection returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatView {
    pub id: u32,
    pub label: String,
    pub status: SeatStatus,
}

/// Fixed inventory layout: `seat_count` seats labelled `{prefix}1..{prefix}N`
#[derive(Debug, Clone)]
pub struct InventoryLayout {
    pub seat_count: u32,
    pub label_prefix: String,
}

impl InventoryLayout {
    pub fn new(seat_count: u32, label_prefix: impl Into<String>) -> Self {
        Self {
            seat_count,
            label_prefix: label_prefix.into(),
        }
    }

    pub fn seats(&self) -> Vec<Seat> {
        (1..=self.seat_count)
            .map(|n| Seat::new(n, format!("{}{}", self.label_prefix, n)))
            .collect()
    }
}

impl Default for InventoryLayout {
    fn default() -> Self {
        Self::new(200, "A")
    }
}
