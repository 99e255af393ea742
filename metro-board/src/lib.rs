//! Muni Metro arrivals board server.
//!
//! Polls the 511.org StopMonitoring API (or a static snapshot of it) for
//! two fixed stops, merges their inbound arrivals into one ranked list,
//! and serves the next few as a web page.

pub mod board;
pub mod config;
pub mod controller;
pub mod domain;
pub mod feeds;
pub mod siri;
pub mod store;
pub mod web;
