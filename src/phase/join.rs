use crate::ids::PlayerId;
use crate::session::ChallengeSession;
use super::countdown::{Countdown, CountdownTick};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinState {
    Counting,
    Resolved,
}

/// What the registry must do after a join-phase tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinStep {
    /// Announce `time_left` to the participants; keep counting.
    Countdown { time_left: u32 },
    /// Window closed without quorum. Terminal, no retry.
    Aborted { time_left: u32 },
    /// Window closed with quorum; the ready phase takes `roster`.
    Advanced { time_left: u32, roster: Vec<PlayerId> },
}

impl JoinStep {
    pub fn announced(&self) -> u32 {
        match self {
            JoinStep::Countdown { time_left }
            | JoinStep::Aborted { time_left }
            | JoinStep::Advanced { time_left, .. } => *time_left,
        }
    }
}

/// Join window: counts down while players sign up, then decides once
/// whether the war goes ahead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinPhase {
    countdown: Countdown,
    state: JoinState,
}

impl JoinPhase {
    pub fn new(window: u32) -> Self {
        JoinPhase { countdown: Countdown::new(window), state: JoinState::Counting }
    }

    pub fn state(&self) -> JoinState {
        self.state
    }

    pub fn time_left(&self) -> u32 {
        self.countdown.remaining()
    }

    /// Runs one tick. On expiry the session's join window is closed and
    /// `quorum` is consulted exactly once. Returns `None` after resolution.
    pub fn on_tick<Q>(&mut self, session: &mut ChallengeSession, quorum: Q) -> Option<JoinStep>
    where
        Q: FnOnce(&ChallengeSession) -> bool,
    {
        if self.state == JoinState::Resolved {
            return None;
        }
        match self.countdown.tick()? {
            CountdownTick::Running { announced, .. } => Some(JoinStep::Countdown { time_left: announced }),
            CountdownTick::Expired { announced } => {
                self.state = JoinState::Resolved;
                session.close_joins();
                if quorum(session) {
                    Some(JoinStep::Advanced { time_left: announced, roster: session.participants() })
                } else {
                    Some(JoinStep::Aborted { time_left: announced })
                }
            }
        }
    }
}
