//! Application state for the web layer.

use crate::config::ServerConfig;
use crate::controller::BoardController;
use crate::feeds::{LiveFeeds, StaticCache};
use crate::siri::{FeedError, SiriClient};
use crate::store::{FileStore, StoreError};

/// The board as served: live feeds, persisted to a file.
pub type Board = BoardController<LiveFeeds, FileStore>;

/// Errors building the board at startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("failed to create HTTP client: {0}")]
    Client(#[from] FeedError),

    #[error("failed to open store: {0}")]
    Store(#[from] StoreError),
}

/// Build the board from configuration. Nothing is fetched yet.
pub fn build_board(config: &ServerConfig) -> Result<Board, StartupError> {
    let cache = StaticCache::new(config.cache.clone(), config.siri.timeout_secs)?;
    let siri = SiriClient::new(config.siri.clone())?;
    let feeds = LiveFeeds::new(cache, siri, config.board.stops.clone());
    let store = FileStore::open(&config.store_path)?;

    Ok(BoardController::new(
        feeds,
        store,
        config.board.clone(),
        config.poll_interval,
    ))
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub board: Board,
}

impl AppState {
    pub fn new(board: Board) -> Self {
        Self { board }
    }
}
