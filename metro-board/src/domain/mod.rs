//! Domain types for the arrivals board.
//!
//! Validated value types shared by the fetch, ranking and persistence
//! layers. Types enforce their invariants at construction time, so code
//! that receives them can trust their validity.

mod api_key;
mod arrival;
mod snapshot;
mod stop;

pub use api_key::{ApiKey, InvalidApiKey};
pub use arrival::{ArrivalRecord, NO_ESTIMATE_MINUTES};
pub use snapshot::{CombinedSnapshot, SnapshotSource, StopArrivalFeed};
pub use stop::{InvalidStopCode, MUNI_METRO, StopCode, StopPair, TrackedStop};
