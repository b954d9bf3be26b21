use serde::{Serialize, Deserialize};
use crate::ids::{ArenaId, ChallengeId, GuildId, PlayerId};
use crate::session::Side;

/// Why a war left the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    InsufficientParticipants,
    Cancelled,
    Finished,
}

/// Lifecycle events published to registry subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WarEvent {
    Created {
        challenge_id: ChallengeId,
        challenger: GuildId,
        defender: GuildId,
        arena: ArenaId,
    },
    Joined {
        challenge_id: ChallengeId,
        player_id: PlayerId,
        side: Side,
    },
    Left {
        challenge_id: ChallengeId,
        player_id: PlayerId,
        side: Side,
    },
    JoinCountdown {
        challenge_id: ChallengeId,
        time_left: u32,
    },
    ReadyCountdown {
        challenge_id: ChallengeId,
        time_left: u32,
    },
    ReadyPhaseStarted {
        challenge_id: ChallengeId,
        roster: Vec<PlayerId>,
    },
    MatchStarted {
        challenge_id: ChallengeId,
        arena: ArenaId,
        roster: Vec<PlayerId>,
    },
    Removed {
        challenge_id: ChallengeId,
        reason: RemovalReason,
    },
}

impl WarEvent {
    pub fn challenge_id(&self) -> ChallengeId {
        match self {
            WarEvent::Created { challenge_id, .. }
            | WarEvent::Joined { challenge_id, .. }
            | WarEvent::Left { challenge_id, .. }
            | WarEvent::JoinCountdown { challenge_id, .. }
            | WarEvent::ReadyCountdown { challenge_id, .. }
            | WarEvent::ReadyPhaseStarted { challenge_id, .. }
            | WarEvent::MatchStarted { challenge_id, .. }
            | WarEvent::Removed { challenge_id, .. } => *challenge_id,
        }
    }
}
