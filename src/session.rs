use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use serde::{Serialize, Deserialize};
use crate::error::ChallengeError;
use crate::ids::{ArenaId, ChallengeId, GuildId, PlayerId};

/// Which guild a participant fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Challenger,
    Defender,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Challenger, Side::Defender];
}

impl FromStr for Side {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "challenger" | "attack" => Ok(Side::Challenger),
            "defender" | "defend" => Ok(Side::Defender),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Side::Challenger => write!(f, "challenger"),
            Side::Defender => write!(f, "defender"),
        }
    }
}

fn epoch_secs_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// One war between two guilds: who fights on each side, where, and whether
/// the join window is still open.
///
/// Sessions are owned by the registry; everything else sees clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeSession {
    id: ChallengeId,
    challenger: GuildId,
    defender: GuildId,
    challenge_players: Vec<PlayerId>,
    defend_players: Vec<PlayerId>,
    arena: ArenaId,
    joinable: bool,
    created_at_epoch_secs: u64,
}

impl ChallengeSession {
    pub fn new(id: ChallengeId, challenger: GuildId, defender: GuildId, arena: ArenaId) -> Self {
        ChallengeSession {
            id,
            challenger,
            defender,
            challenge_players: Vec::new(),
            defend_players: Vec::new(),
            arena,
            joinable: true,
            created_at_epoch_secs: epoch_secs_now(),
        }
    }

    pub fn id(&self) -> ChallengeId {
        self.id
    }

    pub fn challenger(&self) -> GuildId {
        self.challenger
    }

    pub fn defender(&self) -> GuildId {
        self.defender
    }

    pub fn arena(&self) -> &ArenaId {
        &self.arena
    }

    pub fn is_joinable(&self) -> bool {
        self.joinable
    }

    pub fn created_at_epoch_secs(&self) -> u64 {
        self.created_at_epoch_secs
    }

    pub fn guild(&self, side: Side) -> GuildId {
        match side {
            Side::Challenger => self.challenger,
            Side::Defender => self.defender,
        }
    }

    pub fn involves_guild(&self, guild: GuildId) -> bool {
        self.challenger == guild || self.defender == guild
    }

    pub fn roster(&self, side: Side) -> &[PlayerId] {
        match side {
            Side::Challenger => &self.challenge_players,
            Side::Defender => &self.defend_players,
        }
    }

    pub fn side_of(&self, player: PlayerId) -> Option<Side> {
        Side::ALL.into_iter().find(|side| self.roster(*side).contains(&player))
    }

    pub fn contains_player(&self, player: PlayerId) -> bool {
        self.side_of(player).is_some()
    }

    /// Both rosters, challengers first, in join order.
    pub fn participants(&self) -> Vec<PlayerId> {
        self.challenge_players
            .iter()
            .chain(self.defend_players.iter())
            .copied()
            .collect()
    }

    fn roster_mut(&mut self, side: Side) -> &mut Vec<PlayerId> {
        match side {
            Side::Challenger => &mut self.challenge_players,
            Side::Defender => &mut self.defend_players,
        }
    }

    pub(crate) fn add_player(&mut self, player: PlayerId, side: Side, max_per_side: Option<usize>) -> Result<(), ChallengeError> {
        if !self.joinable {
            return Err(ChallengeError::NotJoinable);
        }
        if self.contains_player(player) {
            return Err(ChallengeError::AlreadyJoined(player));
        }
        if let Some(max) = max_per_side {
            if self.roster(side).len() >= max {
                return Err(ChallengeError::SideFull(side));
            }
        }
        self.roster_mut(side).push(player);
        Ok(())
    }

    /// Drops a player from whichever roster holds them. Only allowed while
    /// joins are open; afterwards rosters are frozen.
    pub(crate) fn remove_player(&mut self, player: PlayerId) -> Option<Side> {
        if !self.joinable {
            return None;
        }
        let side = self.side_of(player)?;
        self.roster_mut(side).retain(|p| *p != player);
        Some(side)
    }

    /// Closes the join window. Returns true only on the call that closed it.
    pub(crate) fn close_joins(&mut self) -> bool {
        std::mem::replace(&mut self.joinable, false)
    }
}
