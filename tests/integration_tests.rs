use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use guild_war::{
    ArenaId, ChallengeError, ChallengeRegistry, GuildId, MatchHandoff, MatchStarter, MessageKey, Notifier, PhaseKind,
    PlayerHandle, PlayerId, Presence, RemovalReason, Side, Substitutions, WarEvent, WarScheduler, WarSettings,
};
use tokio::time::sleep;

#[derive(Default)]
struct Recorded {
    to_players: Vec<(PlayerId, MessageKey, Option<String>)>,
    to_guilds: Vec<(GuildId, MessageKey)>,
    handoffs: Vec<MatchHandoff>,
    offline: HashSet<PlayerId>,
}

#[derive(Clone, Default)]
struct Host(Arc<Mutex<Recorded>>);

impl Host {
    fn amounts(&self, player: PlayerId, key: MessageKey) -> Vec<String> {
        let rec = self.0.lock().unwrap();
        rec.to_players
            .iter()
            .filter(|(p, k, _)| *p == player && *k == key)
            .filter_map(|(_, _, amount)| amount.clone())
            .collect()
    }

    fn guild_keys(&self) -> Vec<(GuildId, MessageKey)> {
        self.0.lock().unwrap().to_guilds.clone()
    }

    fn handoffs(&self) -> Vec<MatchHandoff> {
        self.0.lock().unwrap().handoffs.clone()
    }
}

impl Notifier for Host {
    fn notify(&self, player: PlayerId, key: MessageKey, subs: &Substitutions) {
        let amount = subs.iter().find(|(k, _)| *k == "amount").map(|(_, v)| v.clone());
        self.0.lock().unwrap().to_players.push((player, key, amount));
    }

    fn notify_guild(&self, guild: GuildId, key: MessageKey, _subs: &Substitutions) {
        self.0.lock().unwrap().to_guilds.push((guild, key));
    }
}

impl Presence for Host {
    fn resolve_player(&self, player: PlayerId) -> Option<PlayerHandle> {
        let offline = self.0.lock().unwrap().offline.contains(&player);
        (!offline).then(|| PlayerHandle { id: player, name: Some("tester".to_string()) })
    }
}

impl MatchStarter for Host {
    fn start_match(&self, handoff: MatchHandoff) {
        self.0.lock().unwrap().handoffs.push(handoff);
    }
}

fn setup(join: u32, ready: u32) -> (WarScheduler, Host) {
    let host = Host::default();
    let settings = WarSettings { join_time_secs: join, ready_time_secs: ready, ..WarSettings::default() };
    let registry = ChallengeRegistry::new(settings, Arc::new(host.clone()), Arc::new(host.clone()), Arc::new(host.clone()))
        .unwrap();
    registry.add_arena(ArenaId::new("colosseum")).unwrap();
    registry.add_arena(ArenaId::new("bridge")).unwrap();
    (WarScheduler::new(registry), host)
}

#[tokio::test(start_paused = true)]
async fn test_war_without_quorum_is_aborted() {
    let (scheduler, host) = setup(3, 5);
    let registry = scheduler.registry().clone();
    let (a, b) = (GuildId::new_v4(), GuildId::new_v4());
    let war = scheduler.issue_war(a, b, ArenaId::new("colosseum")).unwrap();
    let alice = PlayerId::new_v4();
    registry.join_challenge(war.id(), alice, Side::Challenger).unwrap();

    sleep(Duration::from_millis(1500)).await;
    assert_eq!(registry.phase(war.id()), Some(PhaseKind::Joining));

    sleep(Duration::from_secs(1)).await;
    assert!(registry.get(war.id()).is_none());
    assert!(!registry.arena_in_use(&ArenaId::new("colosseum")).unwrap());
    assert_eq!(host.amounts(alice, MessageKey::JoinCountdown), vec!["3", "2", "1"]);
    assert_eq!(
        host.guild_keys(),
        vec![(a, MessageKey::InsufficientParticipants), (b, MessageKey::InsufficientParticipants)]
    );

    sleep(Duration::from_secs(10)).await;
    assert_eq!(host.amounts(alice, MessageKey::JoinCountdown).len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_war_runs_through_ready_countdown() {
    let (scheduler, host) = setup(3, 2);
    let registry = scheduler.registry().clone();
    let war = scheduler.issue_war(GuildId::new_v4(), GuildId::new_v4(), ArenaId::new("colosseum")).unwrap();
    let alice = PlayerId::new_v4();
    let bob = PlayerId::new_v4();
    registry.join_challenge(war.id(), alice, Side::Challenger).unwrap();

    sleep(Duration::from_millis(500)).await;
    registry.join_challenge(war.id(), bob, Side::Defender).unwrap();

    sleep(Duration::from_secs(2)).await;
    assert_eq!(registry.phase(war.id()), Some(PhaseKind::ReadyCountdown));
    assert_eq!(registry.time_left(war.id()), Some(1));
    assert_eq!(
        registry.join_challenge(war.id(), PlayerId::new_v4(), Side::Defender),
        Err(ChallengeError::NotJoinable)
    );

    sleep(Duration::from_secs(1)).await;
    assert_eq!(registry.phase(war.id()), Some(PhaseKind::Started));
    let handoffs = host.handoffs();
    assert_eq!(handoffs.len(), 1);
    assert_eq!(handoffs[0].roster, vec![alice, bob]);
    assert_eq!(host.amounts(bob, MessageKey::JoinCountdown), vec!["2", "1"]);
    assert_eq!(host.amounts(bob, MessageKey::ReadyCountdown), vec!["2", "1"]);
    assert!(registry.arena_in_use(&ArenaId::new("colosseum")).unwrap());

    sleep(Duration::from_secs(10)).await;
    assert_eq!(host.handoffs().len(), 1);
    assert!(registry.finish_challenge(war.id()));
    assert!(!registry.arena_in_use(&ArenaId::new("colosseum")).unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_the_driver() {
    let (scheduler, host) = setup(5, 5);
    let registry = scheduler.registry().clone();
    let (a, b) = (GuildId::new_v4(), GuildId::new_v4());
    let war = scheduler.issue_war(a, b, ArenaId::new("colosseum")).unwrap();
    let alice = PlayerId::new_v4();
    registry.join_challenge(war.id(), alice, Side::Challenger).unwrap();

    sleep(Duration::from_millis(1500)).await;
    assert!(registry.cancel_for_guild(b));

    sleep(Duration::from_secs(10)).await;
    assert_eq!(host.amounts(alice, MessageKey::JoinCountdown), vec!["5", "4"]);
    assert_eq!(host.guild_keys(), vec![(a, MessageKey::WarCancelled), (b, MessageKey::WarCancelled)]);
    assert!(registry.is_empty());

    let again = scheduler.issue_war(b, a, ArenaId::new("colosseum"));
    assert!(again.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_wars_in_separate_arenas_run_independently() {
    let (scheduler, host) = setup(2, 1);
    let registry = scheduler.registry().clone();
    let mut events = registry.subscribe();

    let full = scheduler.issue_war(GuildId::new_v4(), GuildId::new_v4(), ArenaId::new("colosseum")).unwrap();
    let empty = scheduler.issue_war(GuildId::new_v4(), GuildId::new_v4(), ArenaId::new("bridge")).unwrap();
    registry.join_challenge(full.id(), PlayerId::new_v4(), Side::Challenger).unwrap();
    registry.join_challenge(full.id(), PlayerId::new_v4(), Side::Defender).unwrap();

    sleep(Duration::from_secs(5)).await;

    assert_eq!(host.handoffs().len(), 1);
    assert_eq!(host.handoffs()[0].challenge_id, full.id());
    assert!(registry.get(empty.id()).is_none());

    let mut removed = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let WarEvent::Removed { challenge_id, reason } = event {
            removed.push((challenge_id, reason));
        }
    }
    assert_eq!(removed, vec![(empty.id(), RemovalReason::InsufficientParticipants)]);
}

#[tokio::test(start_paused = true)]
async fn test_busy_arena_rejected_through_scheduler() {
    let (scheduler, _host) = setup(3, 3);
    scheduler.issue_war(GuildId::new_v4(), GuildId::new_v4(), ArenaId::new("colosseum")).unwrap();

    let second = scheduler.issue_war(GuildId::new_v4(), GuildId::new_v4(), ArenaId::new("colosseum"));
    assert_eq!(second.unwrap_err(), ChallengeError::ArenaBusy(ArenaId::new("colosseum")));
    assert_eq!(scheduler.registry().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_second_drive_does_not_double_tick() {
    for _ in 0..25 {
        let (scheduler, _host) = setup(10, 5);
        let registry = scheduler.registry().clone();
        let war = scheduler.issue_war(GuildId::new_v4(), GuildId::new_v4(), ArenaId::new("colosseum")).unwrap();

        assert!(!scheduler.drive(war.id()));
        assert!(!scheduler.drive(war.id()));

        sleep(Duration::from_millis(40)).await;
        assert_eq!(registry.time_left(war.id()), Some(9));
        assert!(registry.remove_challenge(war.id()));
    }
}

#[tokio::test]
async fn test_drive_unknown_war_spawns_nothing() {
    let (scheduler, _host) = setup(3, 3);
    assert!(!scheduler.drive(guild_war::ChallengeId::new_v4()));
}
