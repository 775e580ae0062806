use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::Seat;
use crate::repository::{SeatRepository, StoreError};

#[derive(Debug, Default)]
struct SeatTable {
    seats: BTreeMap<u32, Seat>,
    by_label: HashMap<String, u32>,
}

/// In-memory seat table.
///
/// Each update checks and swaps the whole `Seat` under the write lock, so
/// concurrent readers never observe a half-written seat.
#[derive(Debug, Default)]
pub struct MemorySeatRepository {
    table: RwLock<SeatTable>,
}

impl MemorySeatRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SeatRepository for MemorySeatRepository {
    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.table.read().await.seats.len())
    }

    async fn insert_many(&self, seats: &[Seat]) -> Result<(), StoreError> {
        let mut table = self.table.write().await;

        for seat in seats {
            if table.by_label.contains_key(&seat.label) {
                return Err(StoreError::Backend(format!("Duplicate seat label: {}", seat.label)));
            }
        }

        for seat in seats {
            table.by_label.insert(seat.label.clone(), seat.id);
            table.seats.insert(seat.id, seat.clone());
        }
        Ok(())
    }

    async fn get(&self, label: &str) -> Result<Option<Seat>, StoreError> {
        let table = self.table.read().await;
        Ok(table
            .by_label
            .get(label)
            .and_then(|id| table.seats.get(id))
            .cloned())
    }

    async fn all(&self) -> Result<Vec<Seat>, StoreError> {
        Ok(self.table.read().await.seats.values().cloned().collect())
    }

    async fn update(&self, expected: &Seat, next: &Seat) -> Result<(), StoreError> {
        let mut table = self.table.write().await;
        match table.seats.get_mut(&next.id) {
            Some(existing) if existing.label == next.label => {
                if existing.status != expected.status
                    || existing.hold_deadline != expected.hold_deadline
                {
                    return Err(StoreError::Stale {
                        label: existing.label.clone(),
                        actual: existing.status,
                    });
                }
                *existing = next.clone();
                Ok(())
            }
            _ => Err(StoreError::Backend(format!("Unknown seat: {}", next.label))),
        }
    }
}
