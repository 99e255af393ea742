//! The polling state machine.

/// Whether the board is polling the upstream API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollState {
    /// No API key saved.
    #[default]
    Idle,
    /// Key saved and the page is visible; the timer runs.
    PollingWithCredential,
    /// Key saved but the page is hidden; the timer is stopped.
    PollingSuspended,
}

/// Something that can change the polling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEvent {
    CredentialSaved,
    CredentialRemoved,
    Hidden,
    Visible,
}

/// What to do with the poll timer after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// (Re)start the timer. A running timer is replaced.
    Start,
    /// Stop the timer if one is running.
    Stop,
    /// Leave the timer as it is.
    Keep,
}

impl PollState {
    /// Apply an event. `visible` is the page visibility at the time of the
    /// event; it only matters when a key is saved from idle.
    pub fn on(self, event: PollEvent, visible: bool) -> (PollState, TimerCommand) {
        use PollEvent::*;
        use PollState::*;

        match (self, event) {
            (Idle, CredentialSaved) if visible => (PollingWithCredential, TimerCommand::Start),
            (Idle, CredentialSaved) => (PollingSuspended, TimerCommand::Keep),
            (Idle, _) => (Idle, TimerCommand::Keep),

            (PollingWithCredential, CredentialSaved) => {
                (PollingWithCredential, TimerCommand::Start)
            }
            (PollingWithCredential, CredentialRemoved) => (Idle, TimerCommand::Stop),
            (PollingWithCredential, Hidden) => (PollingSuspended, TimerCommand::Stop),
            (PollingWithCredential, Visible) => (PollingWithCredential, TimerCommand::Keep),

            (PollingSuspended, CredentialRemoved) => (Idle, TimerCommand::Stop),
            (PollingSuspended, Visible) => (PollingWithCredential, TimerCommand::Start),
            (PollingSuspended, CredentialSaved | Hidden) => {
                (PollingSuspended, TimerCommand::Keep)
            }
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PollState::Idle => "idle",
            PollState::PollingWithCredential => "polling",
            PollState::PollingSuspended => "suspended",
        }
    }
}
