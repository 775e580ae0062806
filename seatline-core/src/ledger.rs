use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::events::{SeatEvent, SeatEventKind};
use crate::expiry::{deadline_for, is_expired};
use crate::models::{InventoryLayout, Seat, SeatStatus, SeatView};
use crate::repository::{SeatRepository, StoreError};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Seat not found: {label}")]
    NotFound { label: String },

    #[error("Seat {label} is {status}")]
    Conflict { label: String, status: SeatStatus },

    #[error(transparent)]
    Storage(#[from] StoreError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Single source of truth for seat state.
///
/// Every check-then-write runs while holding `mutation`, so two callers can
/// never both see a seat as `Available` and both reserve it. Writes are also
/// conditional on the seat read, which covers other processes sharing the
/// same store. Expired holds are released lazily by whichever call touches
/// the seat next.
pub struct SeatLedger {
    repo: Arc<dyn SeatRepository>,
    mutation: Mutex<()>,
    events: broadcast::Sender<SeatEvent>,
}

impl SeatLedger {
    pub fn new(repo: Arc<dyn SeatRepository>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            repo,
            mutation: Mutex::new(()),
            events,
        }
    }

    /// Seed the inventory if the backing store is empty.
    /// Returns the number of seats created.
    pub async fn initialize(&self, layout: &InventoryLayout) -> LedgerResult<usize> {
        let _guard = self.mutation.lock().await;

        let existing = self.repo.count().await?;
        if existing > 0 {
            info!(seats = existing, "Inventory already initialized");
            return Ok(0);
        }

        let seats = layout.seats();
        self.repo.insert_many(&seats).await?;
        info!(seats = seats.len(), prefix = %layout.label_prefix, "Inventory initialized");
        Ok(seats.len())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SeatEvent> {
        self.events.subscribe()
    }

    /// Number of seats in the store. Read-only: takes no lock, releases nothing.
    pub async fn seat_count(&self) -> LedgerResult<usize> {
        Ok(self.repo.count().await?)
    }

    /// All seats ordered by id, after releasing every expired hold.
    pub async fn list_all(&self, now: i64) -> LedgerResult<Vec<SeatView>> {
        self.sweep_expired(now).await?;
        let seats = self.repo.all().await?;
        Ok(seats.iter().map(Seat::view).collect())
    }

    /// Single seat lookup, releasing its hold first if it has expired.
    pub async fn get(&self, label: &str, now: i64) -> LedgerResult<Seat> {
        let _guard = self.mutation.lock().await;
        let seat = self.load(label).await?;
        self.settle(seat, now).await
    }

    /// Transition: Available → Reserved with `hold_deadline = now + hold_seconds`
    pub async fn reserve(&self, label: &str, now: i64, hold_seconds: u64) -> LedgerResult<Seat> {
        let _guard = self.mutation.lock().await;

        let seat = self.load(label).await?;
        let seat = self.settle(seat, now).await?;

        if seat.status != SeatStatus::Available {
            debug!(label = %label, status = %seat.status, "Reserve rejected");
            return Err(LedgerError::Conflict {
                label: seat.label,
                status: seat.status,
            });
        }

        let mut next = seat.clone();
        next.hold_until(deadline_for(now, hold_seconds));
        let seat = self.commit(&seat, next).await?;

        info!(label = %seat.label, hold_deadline = ?seat.hold_deadline, "Seat reserved");
        self.publish(SeatEventKind::Reserved, &seat);
        Ok(seat)
    }

    /// Transition: Reserved → Sold
    ///
    /// The hold deadline is not compared against the current time here: a
    /// hold that lapsed but has not been swept yet can still be purchased.
    pub async fn purchase(&self, label: &str) -> LedgerResult<Seat> {
        let _guard = self.mutation.lock().await;

        let seat = self.load(label).await?;

        if seat.status != SeatStatus::Reserved {
            debug!(label = %label, status = %seat.status, "Purchase rejected");
            return Err(LedgerError::Conflict {
                label: seat.label,
                status: seat.status,
            });
        }

        let mut next = seat.clone();
        next.mark_sold();
        let seat = self.commit(&seat, next).await?;

        info!(label = %seat.label, "Seat sold");
        self.publish(SeatEventKind::Sold, &seat);
        Ok(seat)
    }

    /// Release every hold whose deadline is before `now`.
    /// Returns the number of seats released.
    pub async fn sweep_expired(&self, now: i64) -> LedgerResult<usize> {
        let _guard = self.mutation.lock().await;

        let mut released = 0;
        for seat in self.repo.all().await? {
            if !is_expired(&seat, now) {
                continue;
            }
            match self.release(&seat).await {
                Ok(_) => released += 1,
                // Someone else settled it first
                Err(LedgerError::Conflict { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        if released > 0 {
            debug!(released, now, "Expired holds swept");
        }
        Ok(released)
    }

    async fn load(&self, label: &str) -> LedgerResult<Seat> {
        self.repo
            .get(label)
            .await?
            .ok_or_else(|| LedgerError::NotFound {
                label: label.to_string(),
            })
    }

    /// Caller must hold `mutation`.
    async fn settle(&self, seat: Seat, now: i64) -> LedgerResult<Seat> {
        if !is_expired(&seat, now) {
            return Ok(seat);
        }
        match self.release(&seat).await {
            // Lost the release to another writer; use what it left behind
            Err(LedgerError::Conflict { .. }) => self.load(&seat.label).await,
            other => other,
        }
    }

    /// Caller must hold `mutation`.
    async fn release(&self, seat: &Seat) -> LedgerResult<Seat> {
        let mut next = seat.clone();
        next.release();
        let seat = self.commit(seat, next).await?;

        info!(label = %seat.label, "Expired hold released");
        self.publish(SeatEventKind::Released, &seat);
        Ok(seat)
    }

    /// Write `next` only if the store still holds `current`.
    async fn commit(&self, current: &Seat, next: Seat) -> LedgerResult<Seat> {
        match self.repo.update(current, &next).await {
            Ok(()) => Ok(next),
            Err(StoreError::Stale { label, actual }) => {
                warn!(label = %label, status = %actual, "Seat changed underneath this ledger");
                Err(LedgerError::Conflict { label, status: actual })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn publish(&self, kind: SeatEventKind, seat: &Seat) {
        // No subscribers is fine
        let _ = self.events.send(SeatEvent::from_seat(kind, seat));
    }
}
