//! Web layer for the arrivals board.
//!
//! Serves the board page, the arrivals panel (HTML or JSON), and the
//! controls for refreshing, saving the API key and reporting page
//! visibility.

mod dto;
mod routes;
mod state;
pub mod templates;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::{AppState, Board, StartupError, build_board};
pub use templates::*;
