//! Per-war phase state machine.
//!
//! `Joining` → `ReadyCountdown` → `Started`. A war that fails quorum or is
//! cancelled leaves the registry instead of entering a terminal state here.

mod countdown;
mod join;
mod ready;

pub use countdown::{Countdown, CountdownTick};
pub use join::{JoinPhase, JoinState, JoinStep};
pub use ready::{ReadyPhase, ReadyState, ReadyStep};

use serde::{Serialize, Deserialize};
use crate::ids::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarPhase {
    Joining(JoinPhase),
    ReadyCountdown(ReadyPhase),
    Started { roster: Vec<PlayerId> },
}

/// Serializable view of a [`WarPhase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Joining,
    ReadyCountdown,
    Started,
}

impl WarPhase {
    pub fn joining(window: u32) -> Self {
        WarPhase::Joining(JoinPhase::new(window))
    }

    pub fn kind(&self) -> PhaseKind {
        match self {
            WarPhase::Joining(_) => PhaseKind::Joining,
            WarPhase::ReadyCountdown(_) => PhaseKind::ReadyCountdown,
            WarPhase::Started { .. } => PhaseKind::Started,
        }
    }

    /// Ticks left in the current countdown, if one is running.
    pub fn time_left(&self) -> Option<u32> {
        match self {
            WarPhase::Joining(join) => Some(join.time_left()),
            WarPhase::ReadyCountdown(ready) => Some(ready.time_left()),
            WarPhase::Started { .. } => None,
        }
    }
}
