use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use crate::arena::Arena;
use crate::config::WarSettings;
use crate::error::{ChallengeError, ConfigError};
use crate::events::{RemovalReason, WarEvent};
use crate::ids::{ArenaId, ChallengeId, GuildId, PlayerId};
use crate::notify::{broadcast_online, MatchHandoff, MatchStarter, MessageKey, Notifier, Presence};
use crate::phase::{JoinStep, PhaseKind, ReadyPhase, ReadyStep, WarPhase};
use crate::session::{ChallengeSession, Side};

/// Minimum roster size each side needs when the join window closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quorum {
    min_per_side: usize,
}

impl Quorum {
    pub fn new(min_per_side: usize) -> Self {
        Quorum { min_per_side }
    }

    pub fn min_per_side(&self) -> usize {
        self.min_per_side
    }

    pub fn is_met(&self, session: &ChallengeSession) -> bool {
        Side::ALL.iter().all(|side| session.roster(*side).len() >= self.min_per_side)
    }
}

/// Result of driving one tick for a war.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A countdown announced and is still running.
    Counting,
    /// The join window closed with quorum; the ready countdown begins.
    Advanced,
    /// The ready countdown ended and the match routine took over.
    MatchStarted,
    /// The join window closed without quorum; the war was removed.
    Aborted,
    /// Nothing to drive: the war is gone or already started.
    Stopped,
}

impl TickOutcome {
    /// Whether the driver should stop scheduling ticks.
    pub fn is_terminal(self) -> bool {
        matches!(self, TickOutcome::MatchStarted | TickOutcome::Aborted | TickOutcome::Stopped)
    }
}

struct Entry {
    session: ChallengeSession,
    phase: WarPhase,
    /// Set once a driver has claimed this war; never cleared.
    driving: bool,
    driver: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<ChallengeId, Entry>,
    arenas: HashMap<ArenaId, Arena>,
}

impl Inner {
    fn find_by_guild(&self, guild: GuildId) -> Option<&Entry> {
        self.sessions.values().find(|e| e.session.involves_guild(guild))
    }

    fn find_by_player(&self, player: PlayerId) -> Option<&Entry> {
        self.sessions.values().find(|e| e.session.contains_player(player))
    }

    /// Deregisters a war and frees its arena. `None` if it was already gone.
    fn teardown(&mut self, id: ChallengeId) -> Option<Entry> {
        let entry = self.sessions.remove(&id)?;
        if let Some(arena) = self.arenas.get_mut(entry.session.arena()) {
            arena.release(id);
        }
        Some(entry)
    }
}

/// Side effects collected under the lock and run after it is released.
enum Effect {
    Broadcast { players: Vec<PlayerId>, key: MessageKey, subs: Vec<(&'static str, String)> },
    NotifyGuild { guild: GuildId, key: MessageKey, subs: Vec<(&'static str, String)> },
    StartMatch(MatchHandoff),
}

enum Step {
    Join(JoinStep),
    Ready(ReadyStep, Vec<PlayerId>),
}

/// Owns every in-flight war and the arenas they fight in. All mutation goes
/// through one mutex, so the one-war-per-guild and one-war-per-arena rules
/// hold even with ticks and requests arriving from many tasks.
#[derive(Clone)]
pub struct ChallengeRegistry {
    settings: Arc<WarSettings>,
    quorum: Quorum,
    inner: Arc<Mutex<Inner>>,
    events: broadcast::Sender<WarEvent>,
    notifier: Arc<dyn Notifier>,
    presence: Arc<dyn Presence>,
    match_starter: Arc<dyn MatchStarter>,
}

impl ChallengeRegistry {
    pub fn new(
        settings: WarSettings,
        notifier: Arc<dyn Notifier>,
        presence: Arc<dyn Presence>,
        match_starter: Arc<dyn MatchStarter>,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let (events, _) = broadcast::channel(256);
        Ok(ChallengeRegistry {
            quorum: Quorum::new(settings.min_players),
            settings: Arc::new(settings),
            inner: Arc::new(Mutex::new(Inner::default())),
            events,
            notifier,
            presence,
            match_starter,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, ChallengeError> {
        self.inner.lock().map_err(|_| ChallengeError::LockError)
    }

    fn emit(&self, event: WarEvent) {
        let _ = self.events.send(event);
    }

    pub fn settings(&self) -> &WarSettings {
        &self.settings
    }

    pub fn quorum(&self) -> Quorum {
        self.quorum
    }

    /// Subscribe to lifecycle events of every war.
    pub fn subscribe(&self) -> broadcast::Receiver<WarEvent> {
        self.events.subscribe()
    }

    /// Register an arena. Returns false if one with this id already exists.
    pub fn add_arena(&self, id: ArenaId) -> Result<bool, ChallengeError> {
        let mut inner = self.lock()?;
        if inner.arenas.contains_key(&id) {
            return Ok(false);
        }
        inner.arenas.insert(id.clone(), Arena::new(id));
        Ok(true)
    }

    pub fn arena_in_use(&self, id: &ArenaId) -> Result<bool, ChallengeError> {
        let inner = self.lock()?;
        inner
            .arenas
            .get(id)
            .map(Arena::is_in_use)
            .ok_or_else(|| ChallengeError::UnknownArena(id.clone()))
    }

    pub fn arenas(&self) -> Vec<Arena> {
        match self.lock() {
            Ok(inner) => inner.arenas.values().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Registers a new war, reserving `arena` for it and opening the join
    /// window. Nothing is mutated when this fails.
    pub fn create_challenge(
        &self,
        challenger: GuildId,
        defender: GuildId,
        arena: ArenaId,
    ) -> Result<ChallengeSession, ChallengeError> {
        if challenger == defender {
            return Err(ChallengeError::SelfChallenge);
        }
        let mut inner = self.lock()?;
        for guild in [challenger, defender] {
            if inner.find_by_guild(guild).is_some() {
                warn!(%guild, "rejected challenge: guild already engaged");
                return Err(ChallengeError::GuildEngaged(guild));
            }
        }

        let challenge_id = ChallengeId::new_v4();
        let slot = inner
            .arenas
            .get_mut(&arena)
            .ok_or_else(|| ChallengeError::UnknownArena(arena.clone()))?;
        if let Err(e) = slot.reserve(challenge_id) {
            warn!(arena = %arena, "rejected challenge: arena in use");
            return Err(e.into());
        }

        let session = ChallengeSession::new(challenge_id, challenger, defender, arena.clone());
        inner.sessions.insert(challenge_id, Entry {
            session: session.clone(),
            phase: WarPhase::joining(self.settings.join_time_secs),
            driving: false,
            driver: None,
        });

        info!(challenge = %challenge_id.short_code(), %challenger, %defender, arena = %arena, "war created");
        self.emit(WarEvent::Created { challenge_id, challenger, defender, arena });
        Ok(session)
    }

    pub fn get(&self, challenge_id: ChallengeId) -> Option<ChallengeSession> {
        let inner = self.lock().ok()?;
        inner.sessions.get(&challenge_id).map(|e| e.session.clone())
    }

    pub fn get_by_short_id(&self, code: &str) -> Option<ChallengeSession> {
        self.get(ChallengeId::from_short_code(code)?)
    }

    /// The war a guild is involved in, on either side.
    pub fn get_challenge(&self, guild: GuildId) -> Option<ChallengeSession> {
        let inner = self.lock().ok()?;
        inner.find_by_guild(guild).map(|e| e.session.clone())
    }

    pub fn get_challenge_by_player(&self, player: PlayerId) -> Option<ChallengeSession> {
        let inner = self.lock().ok()?;
        inner.find_by_player(player).map(|e| e.session.clone())
    }

    pub fn list_challenges(&self) -> Vec<ChallengeSession> {
        match self.lock() {
            Ok(inner) => inner.sessions.values().map(|e| e.session.clone()).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map(|inner| inner.sessions.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn phase(&self, challenge_id: ChallengeId) -> Option<PhaseKind> {
        let inner = self.lock().ok()?;
        inner.sessions.get(&challenge_id).map(|e| e.phase.kind())
    }

    /// Ticks left in the war's current countdown.
    pub fn time_left(&self, challenge_id: ChallengeId) -> Option<u32> {
        let inner = self.lock().ok()?;
        inner.sessions.get(&challenge_id).and_then(|e| e.phase.time_left())
    }

    /// The quorum rule: both sides must have at least `min_players`.
    pub fn check_enough_joined(&self, session: &ChallengeSession) -> bool {
        self.quorum.is_met(session)
    }

    pub fn join_challenge(&self, challenge_id: ChallengeId, player: PlayerId, side: Side) -> Result<(), ChallengeError> {
        let mut inner = self.lock()?;
        let engaged_elsewhere = inner
            .sessions
            .values()
            .any(|e| e.session.id() != challenge_id && e.session.contains_player(player));
        if engaged_elsewhere {
            return Err(ChallengeError::PlayerEngaged(player));
        }
        let entry = inner.sessions.get_mut(&challenge_id).ok_or(ChallengeError::NotFound)?;
        entry.session.add_player(player, side, self.settings.max_players)?;

        debug!(challenge = %challenge_id.short_code(), %player, %side, "player joined war");
        self.emit(WarEvent::Joined { challenge_id, player_id: player, side });
        Ok(())
    }

    /// Drops a player from the roster they joined, if the join window is
    /// still open. Returns the war they left.
    pub fn leave_challenge(&self, player: PlayerId) -> Option<ChallengeId> {
        let mut inner = self.lock().ok()?;
        let entry = inner.sessions.values_mut().find(|e| e.session.contains_player(player))?;
        let side = entry.session.remove_player(player)?;
        let challenge_id = entry.session.id();

        debug!(challenge = %challenge_id.short_code(), %player, %side, "player left war");
        self.emit(WarEvent::Left { challenge_id, player_id: player, side });
        Some(challenge_id)
    }

    /// Cancels a war at any point of its lifecycle: stops its driver, frees
    /// the arena and tells both guilds. Returns false if it was already gone.
    pub fn remove_challenge(&self, challenge_id: ChallengeId) -> bool {
        let Ok(mut inner) = self.lock() else {
            return false;
        };
        let Some(entry) = inner.teardown(challenge_id) else {
            return false;
        };
        info!(challenge = %challenge_id.short_code(), "war cancelled");
        self.emit(WarEvent::Removed { challenge_id, reason: RemovalReason::Cancelled });
        drop(inner);

        if let Some(driver) = entry.driver {
            driver.abort();
        }
        let subs = [("challenge", challenge_id.short_code())];
        for side in Side::ALL {
            self.notifier.notify_guild(entry.session.guild(side), MessageKey::WarCancelled, &subs);
        }
        true
    }

    /// Cancels whatever war `guild` is in, e.g. when the guild disbands.
    pub fn cancel_for_guild(&self, guild: GuildId) -> bool {
        match self.get_challenge(guild) {
            Some(session) => self.remove_challenge(session.id()),
            None => false,
        }
    }

    /// Ends a war whose match has started, releasing its arena. Wars still
    /// counting down are left alone; cancel those with `remove_challenge`.
    pub fn finish_challenge(&self, challenge_id: ChallengeId) -> bool {
        let Ok(mut inner) = self.lock() else {
            return false;
        };
        let started = inner
            .sessions
            .get(&challenge_id)
            .is_some_and(|e| e.phase.kind() == PhaseKind::Started);
        if !started || inner.teardown(challenge_id).is_none() {
            return false;
        }

        info!(challenge = %challenge_id.short_code(), "war finished");
        self.emit(WarEvent::Removed { challenge_id, reason: RemovalReason::Finished });
        true
    }

    /// Claim the right to drive a war. Only the first claim on a war that
    /// has not started succeeds; the caller spawns its task only then.
    pub(crate) fn reserve_driver(&self, challenge_id: ChallengeId) -> bool {
        let Ok(mut inner) = self.lock() else {
            return false;
        };
        match inner.sessions.get_mut(&challenge_id) {
            Some(entry) if !entry.driving && entry.phase.kind() != PhaseKind::Started => {
                entry.driving = true;
                true
            }
            _ => false,
        }
    }

    /// Store the task claimed by `reserve_driver` so cancellation can stop
    /// it. If the war is already gone the task is aborted straight away.
    pub(crate) fn attach_driver(&self, challenge_id: ChallengeId, driver: JoinHandle<()>) {
        let mut inner = match self.lock() {
            Ok(inner) => inner,
            Err(_) => {
                driver.abort();
                return;
            }
        };
        match inner.sessions.get_mut(&challenge_id) {
            Some(entry) if entry.phase.kind() != PhaseKind::Started => entry.driver = Some(driver),
            Some(_) => {}
            None => driver.abort(),
        }
    }

    /// Advances a war by one scheduler tick.
    ///
    /// Every countdown tick is announced to online participants. The last
    /// join tick closes the window and applies the quorum rule once; the
    /// last ready tick hands the war to the match routine.
    pub fn tick(&self, challenge_id: ChallengeId) -> TickOutcome {
        let (outcome, effects) = match self.lock() {
            Ok(mut inner) => self.tick_locked(&mut inner, challenge_id),
            Err(_) => return TickOutcome::Stopped,
        };
        self.dispatch(effects);
        outcome
    }

    fn tick_locked(&self, inner: &mut Inner, challenge_id: ChallengeId) -> (TickOutcome, Vec<Effect>) {
        let mut effects = Vec::new();
        let Some(entry) = inner.sessions.get_mut(&challenge_id) else {
            return (TickOutcome::Stopped, effects);
        };
        let quorum = self.quorum;
        let step = match &mut entry.phase {
            WarPhase::Joining(join) => join.on_tick(&mut entry.session, |s| quorum.is_met(s)).map(Step::Join),
            WarPhase::ReadyCountdown(ready) => {
                let roster = ready.roster().to_vec();
                ready.on_tick().map(|step| Step::Ready(step, roster))
            }
            WarPhase::Started { .. } => None,
        };
        let Some(step) = step else {
            return (TickOutcome::Stopped, effects);
        };
        let short = challenge_id.short_code();

        match step {
            Step::Join(step) => {
                let time_left = step.announced();
                effects.push(Effect::Broadcast {
                    players: entry.session.participants(),
                    key: MessageKey::JoinCountdown,
                    subs: vec![("amount", time_left.to_string()), ("challenge", short.clone())],
                });
                self.emit(WarEvent::JoinCountdown { challenge_id, time_left });

                match step {
                    JoinStep::Countdown { .. } => {
                        debug!(challenge = %short, time_left, "join countdown");
                        (TickOutcome::Counting, effects)
                    }
                    JoinStep::Aborted { .. } => {
                        let guilds = Side::ALL.map(|side| entry.session.guild(side));
                        // The driver is the caller here; detach rather than abort it.
                        let _ = inner.teardown(challenge_id);
                        for guild in guilds {
                            effects.push(Effect::NotifyGuild {
                                guild,
                                key: MessageKey::InsufficientParticipants,
                                subs: vec![("challenge", short.clone()), ("amount", quorum.min_per_side().to_string())],
                            });
                        }
                        info!(challenge = %short, min_players = quorum.min_per_side(), "war aborted: not enough participants");
                        self.emit(WarEvent::Removed { challenge_id, reason: RemovalReason::InsufficientParticipants });
                        (TickOutcome::Aborted, effects)
                    }
                    JoinStep::Advanced { roster, .. } => {
                        entry.phase = WarPhase::ReadyCountdown(ReadyPhase::new(self.settings.ready_time_secs, roster.clone()));
                        info!(challenge = %short, participants = roster.len(), "war ready countdown started");
                        self.emit(WarEvent::ReadyPhaseStarted { challenge_id, roster });
                        (TickOutcome::Advanced, effects)
                    }
                }
            }
            Step::Ready(step, roster) => match step {
                ReadyStep::Countdown { time_left } => {
                    effects.push(Effect::Broadcast {
                        players: roster,
                        key: MessageKey::ReadyCountdown,
                        subs: vec![("amount", time_left.to_string()), ("challenge", short.clone())],
                    });
                    debug!(challenge = %short, time_left, "ready countdown");
                    self.emit(WarEvent::ReadyCountdown { challenge_id, time_left });
                    (TickOutcome::Counting, effects)
                }
                ReadyStep::Start { time_left, roster } => {
                    effects.push(Effect::Broadcast {
                        players: roster.clone(),
                        key: MessageKey::ReadyCountdown,
                        subs: vec![("amount", time_left.to_string()), ("challenge", short.clone())],
                    });
                    self.emit(WarEvent::ReadyCountdown { challenge_id, time_left });

                    effects.push(Effect::Broadcast {
                        players: roster.clone(),
                        key: MessageKey::WarStart,
                        subs: vec![("challenge", short.clone())],
                    });
                    let arena = entry.session.arena().clone();
                    effects.push(Effect::StartMatch(MatchHandoff {
                        challenge_id,
                        challenger: entry.session.challenger(),
                        defender: entry.session.defender(),
                        arena: arena.clone(),
                        roster: roster.clone(),
                    }));
                    entry.phase = WarPhase::Started { roster: roster.clone() };
                    entry.driver = None;

                    info!(challenge = %short, arena = %arena, participants = roster.len(), "war started");
                    self.emit(WarEvent::MatchStarted { challenge_id, arena, roster });
                    (TickOutcome::MatchStarted, effects)
                }
            },
        }
    }

    fn dispatch(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Broadcast { players, key, subs } => {
                    broadcast_online(self.notifier.as_ref(), self.presence.as_ref(), &players, key, &subs);
                }
                Effect::NotifyGuild { guild, key, subs } => {
                    self.notifier.notify_guild(guild, key, &subs);
                }
                Effect::StartMatch(handoff) => {
                    self.match_starter.start_match(handoff);
                }
            }
        }
    }
}
