//! The arrivals board.
//!
//! Merges the two tracked stops' feeds into one ranked list and renders
//! it for display.
//!
//! # Algorithm
//!
//! Each stop contributes only its expected line travelling inbound. The
//! merged records are stable-sorted by minutes until arrival (visits with
//! no estimate sort last), optionally trimmed of departed vehicles at the
//! front, and capped at five.

mod config;
mod format;
mod rank;
mod view;

pub use config::{BoardConfig, DepartedPolicy, INBOUND};
pub use format::{SCHEDULE_UNAVAILABLE, format_arrival_time, format_minutes, minutes_until};
pub use rank::{order_arrivals, rank_arrivals};
pub use view::{BoardView, display_time, last_updated_line};
