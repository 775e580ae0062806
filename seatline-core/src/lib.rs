pub mod models;
pub mod expiry;
pub mod clock;
pub mod events;
pub mod repository;
pub mod memory;
pub mod ledger;

pub use models::{InventoryLayout, Seat, SeatStatus, SeatView};
pub use clock::{Clock, ManualClock, SystemClock};
pub use events::{SeatEvent, SeatEventKind};
pub use repository::{SeatRepository, StoreError};
pub use memory::MemorySeatRepository;
pub use ledger::{LedgerError, LedgerResult, SeatLedger};
