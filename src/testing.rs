//! Recording fakes for the host boundaries, shared by unit tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use crate::config::WarSettings;
use crate::ids::{ArenaId, GuildId, PlayerId};
use crate::notify::{MatchHandoff, MatchStarter, MessageKey, Notifier, PlayerHandle, Presence, Substitutions};
use crate::registry::ChallengeRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub player: PlayerId,
    pub key: MessageKey,
    pub amount: Option<String>,
}

#[derive(Default)]
struct Log {
    player_messages: Vec<Sent>,
    guild_messages: Vec<(GuildId, MessageKey)>,
    handoffs: Vec<MatchHandoff>,
    offline: HashSet<PlayerId>,
}

/// Notifier, presence and match starter in one. Everyone is online unless
/// marked otherwise.
#[derive(Clone, Default)]
pub struct Harness {
    log: Arc<Mutex<Log>>,
}

impl Harness {
    pub fn set_offline(&self, player: PlayerId) {
        self.log.lock().unwrap().offline.insert(player);
    }

    pub fn player_messages(&self) -> Vec<Sent> {
        self.log.lock().unwrap().player_messages.clone()
    }

    pub fn messages_for(&self, player: PlayerId) -> Vec<Sent> {
        self.player_messages().into_iter().filter(|s| s.player == player).collect()
    }

    /// Amounts `player` was sent under `key`, in order.
    pub fn announced(&self, player: PlayerId, key: MessageKey) -> Vec<String> {
        self.messages_for(player)
            .into_iter()
            .filter(|s| s.key == key)
            .filter_map(|s| s.amount)
            .collect()
    }

    pub fn guild_messages(&self) -> Vec<(GuildId, MessageKey)> {
        self.log.lock().unwrap().guild_messages.clone()
    }

    pub fn handoffs(&self) -> Vec<MatchHandoff> {
        self.log.lock().unwrap().handoffs.clone()
    }
}

impl Notifier for Harness {
    fn notify(&self, player: PlayerId, key: MessageKey, subs: &Substitutions) {
        let amount = subs.iter().find(|(k, _)| *k == "amount").map(|(_, v)| v.clone());
        self.log.lock().unwrap().player_messages.push(Sent { player, key, amount });
    }

    fn notify_guild(&self, guild: GuildId, key: MessageKey, _subs: &Substitutions) {
        self.log.lock().unwrap().guild_messages.push((guild, key));
    }
}

impl Presence for Harness {
    fn resolve_player(&self, player: PlayerId) -> Option<PlayerHandle> {
        let offline = self.log.lock().unwrap().offline.contains(&player);
        (!offline).then(|| PlayerHandle { id: player, name: None })
    }
}

impl MatchStarter for Harness {
    fn start_match(&self, handoff: MatchHandoff) {
        self.log.lock().unwrap().handoffs.push(handoff);
    }
}

/// A registry wired to a fresh harness, with the arena "pit" registered.
pub fn registry_with(settings: WarSettings) -> (ChallengeRegistry, Harness) {
    let harness = Harness::default();
    let registry = ChallengeRegistry::new(
        settings,
        Arc::new(harness.clone()),
        Arc::new(harness.clone()),
        Arc::new(harness.clone()),
    )
    .unwrap();
    registry.add_arena(ArenaId::new("pit")).unwrap();
    (registry, harness)
}
