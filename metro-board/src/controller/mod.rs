//! The board controller and its polling machinery.
//!
//! [`BoardController`] is built once at startup and shared by every
//! request handler. It owns what the board currently shows, the status
//! line, the persisted key and snapshot, and the poll timer that re-runs
//! a direct fetch while a key is saved and the page is visible.

mod board;
mod poll;
mod status;
mod timer;

pub use board::{
    BoardController, CredentialError, DEFAULT_POLL_INTERVAL, RefreshOutcome, RefreshPath,
};
pub use poll::{PollEvent, PollState, TimerCommand};
pub use status::{StatusLevel, StatusMessage};
pub use timer::PollTimer;
