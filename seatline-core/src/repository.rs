use async_trait::async_trait;

use crate::models::{Seat, SeatStatus};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Corrupt seat record at {key}: {reason}")]
    Corrupt {
        key: String,
        reason: String,
    },

    /// The stored seat no longer matches what the writer read.
    #[error("Seat {label} was changed by another writer, now {actual}")]
    Stale {
        label: String,
        actual: SeatStatus,
    },
}

/// Repository trait for seat data access
///
/// `update` is a compare-and-set on `(status, hold_deadline)`: `next` is
/// written only if the stored seat still matches `expected`, otherwise it
/// fails with `StoreError::Stale` and nothing is written. Status and deadline
/// are written as one unit, so after any failed call the stored seat is
/// exactly what it was before.
#[async_trait]
pub trait SeatRepository: Send + Sync {
    async fn count(&self) -> Result<usize, StoreError>;

    async fn insert_many(&self, seats: &[Seat]) -> Result<(), StoreError>;

    async fn get(&self, label: &str) -> Result<Option<Seat>, StoreError>;

    /// All seats ordered by id
    async fn all(&self) -> Result<Vec<Seat>, StoreError>;

    async fn update(&self, expected: &Seat, next: &Seat) -> Result<(), StoreError>;
}
