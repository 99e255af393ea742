//! Server configuration.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::board::BoardConfig;
use crate::controller::DEFAULT_POLL_INTERVAL;
use crate::feeds::CacheLocation;
use crate::siri::SiriConfig;

/// Environment variable holding an API key to seed the store with.
pub const API_KEY_ENV: &str = "TRANSIT_API_KEY";

/// Everything needed to run the board server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on
    pub addr: SocketAddr,
    /// Where the static cache documents live
    pub cache: CacheLocation,
    /// JSON file holding the saved key and snapshot
    pub store_path: PathBuf,
    /// Page assets served under `/static`
    pub static_dir: PathBuf,
    /// Period between direct fetches while a key is saved
    pub poll_interval: Duration,
    pub siri: SiriConfig,
    pub board: BoardConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            cache: CacheLocation::Directory(PathBuf::from("data")),
            store_path: PathBuf::from("metro_board_store.json"),
            static_dir: PathBuf::from("static"),
            poll_interval: DEFAULT_POLL_INTERVAL,
            siri: SiriConfig::default(),
            board: BoardConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_cache(mut self, cache: CacheLocation) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = path.into();
        self
    }

    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = dir.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_siri(mut self, siri: SiriConfig) -> Self {
        self.siri = siri;
        self
    }

    pub fn with_board(mut self, board: BoardConfig) -> Self {
        self.board = board;
        self
    }

    /// The cache directory, when the cache is local and can be served
    /// under `/data`.
    pub fn data_dir(&self) -> Option<&Path> {
        match &self.cache {
            CacheLocation::Directory(dir) => Some(dir),
            CacheLocation::Url(_) => None,
        }
    }
}
