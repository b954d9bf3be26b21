use crate::ids::PlayerId;
use super::countdown::{Countdown, CountdownTick};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Counting,
    Started,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadyStep {
    Countdown { time_left: u32 },
    /// Hand the war to the match routine with this roster.
    Start { time_left: u32, roster: Vec<PlayerId> },
}

/// Final countdown before the match. The roster is the snapshot taken when
/// the join window closed and is not re-validated here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyPhase {
    countdown: Countdown,
    roster: Vec<PlayerId>,
    state: ReadyState,
}

impl ReadyPhase {
    pub fn new(window: u32, roster: Vec<PlayerId>) -> Self {
        ReadyPhase { countdown: Countdown::new(window), roster, state: ReadyState::Counting }
    }

    pub fn state(&self) -> ReadyState {
        self.state
    }

    pub fn time_left(&self) -> u32 {
        self.countdown.remaining()
    }

    pub fn roster(&self) -> &[PlayerId] {
        &self.roster
    }

    pub fn on_tick(&mut self) -> Option<ReadyStep> {
        if self.state == ReadyState::Started {
            return None;
        }
        match self.countdown.tick()? {
            CountdownTick::Running { announced, .. } => Some(ReadyStep::Countdown { time_left: announced }),
            CountdownTick::Expired { announced } => {
                self.state = ReadyState::Started;
                Some(ReadyStep::Start { time_left: announced, roster: self.roster.clone() })
            }
        }
    }
}
