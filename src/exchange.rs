//! The lifecycle of one request/response exchange.
//!
//! ```text
//! Open -> HeadSent -> BodyStreaming -> Completed
//!   \         \             \
//!    +---------+-------------+----> Aborted
//! ```
//!
//! `HeadSent` is the commit point: once a status line is on the wire it can
//! never be replaced, so any later failure can only abort the connection.

use std::fmt;

use log::debug;

/// Exchange states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Open,
    HeadSent,
    BodyStreaming,
    Completed,
    Aborted,
}

impl ExchangeState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExchangeState::Completed | ExchangeState::Aborted)
    }

    /// Whether the head has been committed to the wire.
    pub fn is_committed(&self) -> bool {
        !matches!(self, ExchangeState::Open)
    }

    fn can_advance_to(&self, next: ExchangeState) -> bool {
        use ExchangeState::*;
        matches!(
            (*self, next),
            (Open, HeadSent)
                | (HeadSent, BodyStreaming)
                | (BodyStreaming, Completed)
                | (Open | HeadSent | BodyStreaming, Aborted)
        )
    }
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// One exchange on one connection, owned by the pipeline that created it.
#[derive(Debug)]
pub struct Exchange {
    id: u64,
    state: ExchangeState,
}

impl Exchange {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            state: ExchangeState::Open,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// Move to `next`. Returns `false`, leaving the state untouched, for any
    /// transition the lifecycle does not allow; nothing leaves a terminal state.
    pub fn advance(&mut self, next: ExchangeState) -> bool {
        if !self.state.can_advance_to(next) {
            debug!("exchange {} rejected {} -> {}", self.id, self.state, next);
            return false;
        }
        debug!("exchange {}: {} -> {}", self.id, self.state, next);
        self.state = next;
        true
    }

    /// Abort from any non-terminal state.
    pub fn abort(&mut self) -> bool {
        self.advance(ExchangeState::Aborted)
    }
}
