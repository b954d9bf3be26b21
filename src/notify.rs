//! Boundaries to the host: message delivery, player presence, and the
//! match routine that takes over once the ready countdown ends.

use std::fmt;
use serde::{Serialize, Deserialize};
use crate::ids::{ArenaId, ChallengeId, GuildId, PlayerId};

/// Template keys the engine sends. Rendering is the host's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKey {
    JoinCountdown,
    ReadyCountdown,
    InsufficientParticipants,
    WarStart,
    WarCancelled,
}

impl MessageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKey::JoinCountdown => "war.join-countdown",
            MessageKey::ReadyCountdown => "war.ready-countdown",
            MessageKey::InsufficientParticipants => "war.not-enough-joined",
            MessageKey::WarStart => "war.start",
            MessageKey::WarCancelled => "war.cancelled",
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Placeholder name/value pairs, e.g. `("amount", "5")`.
pub type Substitutions = [(&'static str, String)];

pub trait Notifier: Send + Sync {
    fn notify(&self, player: PlayerId, key: MessageKey, subs: &Substitutions);

    fn broadcast(&self, players: &[PlayerId], key: MessageKey, subs: &Substitutions) {
        for player in players {
            self.notify(*player, key, subs);
        }
    }

    /// Message every member of a guild.
    fn notify_guild(&self, guild: GuildId, key: MessageKey, subs: &Substitutions);
}

/// A player the host can currently reach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerHandle {
    pub id: PlayerId,
    pub name: Option<String>,
}

pub trait Presence: Send + Sync {
    fn resolve_player(&self, player: PlayerId) -> Option<PlayerHandle>;

    fn is_online(&self, player: PlayerId) -> bool {
        self.resolve_player(player).is_some()
    }
}

/// Everything the match routine needs to start a war.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchHandoff {
    pub challenge_id: ChallengeId,
    pub challenger: GuildId,
    pub defender: GuildId,
    pub arena: ArenaId,
    pub roster: Vec<PlayerId>,
}

pub trait MatchStarter: Send + Sync {
    fn start_match(&self, handoff: MatchHandoff);
}

/// Best-effort delivery: offline players are skipped, not reported.
pub(crate) fn broadcast_online(
    notifier: &dyn Notifier,
    presence: &dyn Presence,
    players: &[PlayerId],
    key: MessageKey,
    subs: &Substitutions,
) -> usize {
    let online: Vec<PlayerId> = players.iter().copied().filter(|p| presence.is_online(*p)).collect();
    if !online.is_empty() {
        notifier.broadcast(&online, key, subs);
    }
    online.len()
}
