//! Board configuration.

use crate::domain::StopPair;

/// Direction reference of inbound vehicles.
pub const INBOUND: &str = "IB";

/// What to do with vehicles whose expected arrival is already past.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepartedPolicy {
    /// Show them; they display as "Arriving now".
    Keep,
    /// Drop negative-minute records from the front of the sorted list.
    #[default]
    DropLeading,
}

/// Configuration parameters for building the board.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// The two stops merged into the board.
    pub stops: StopPair,

    /// Maximum number of arrivals shown.
    pub max_results: usize,

    /// Treatment of already-departed vehicles.
    pub departed: DepartedPolicy,
}

impl BoardConfig {
    /// Set the departed-vehicle policy.
    pub fn with_departed(mut self, departed: DepartedPolicy) -> Self {
        self.departed = departed;
        self
    }

    /// Set the maximum number of arrivals shown.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            stops: StopPair::default(),
            max_results: 5,
            departed: DepartedPolicy::default(),
        }
    }
}
