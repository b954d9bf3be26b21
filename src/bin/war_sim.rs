//! Runs one simulated war end to end and prints its events as JSON lines.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgAction, Parser};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

use guild_war::logging::{init_logging, LogFormat};
use guild_war::{
    ArenaId, ChallengeRegistry, GuildId, MatchHandoff, MatchStarter, MessageKey, Notifier, PlayerHandle, PlayerId,
    Presence, Side, Substitutions, WarEvent, WarScheduler, WarSettings,
};

/// Simulate a guild war with randomly timed joins.
#[derive(Parser, Debug)]
#[command(name = "war-sim", version, about)]
struct Cli {
    /// JSON settings file. Flags below override its values.
    #[arg(long, env = "GUILD_WAR_CONFIG")]
    config: Option<PathBuf>,

    /// Join window, in ticks.
    #[arg(long)]
    join: Option<u32>,

    /// Ready countdown, in ticks.
    #[arg(long)]
    ready: Option<u32>,

    /// Minimum players per side.
    #[arg(long)]
    min_players: Option<usize>,

    /// Tick length in milliseconds.
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Players each guild tries to send.
    #[arg(long, default_value_t = 3)]
    players: usize,

    /// Seed for join timing.
    #[arg(long)]
    seed: Option<u64>,

    /// Log as JSON instead of plain text.
    #[arg(long)]
    json_logs: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn settings(&self) -> Result<WarSettings, guild_war::ConfigError> {
        let mut settings = match &self.config {
            Some(path) => WarSettings::load(path)?,
            None => WarSettings::default(),
        };
        if let Some(join) = self.join {
            settings.join_time_secs = join;
        }
        if let Some(ready) = self.ready {
            settings.ready_time_secs = ready;
        }
        if let Some(min) = self.min_players {
            settings.min_players = min;
        }
        if let Some(tick_ms) = self.tick_ms {
            settings.tick_period_ms = tick_ms;
        }
        settings.validate()?;
        Ok(settings)
    }
}

/// Stands in for chat delivery.
struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, player: PlayerId, key: MessageKey, subs: &Substitutions) {
        debug!(%player, %key, ?subs, "message to player");
    }

    fn notify_guild(&self, guild: GuildId, key: MessageKey, subs: &Substitutions) {
        info!(%guild, %key, ?subs, "message to guild");
    }
}

struct AllOnline;

impl Presence for AllOnline {
    fn resolve_player(&self, player: PlayerId) -> Option<PlayerHandle> {
        Some(PlayerHandle { id: player, name: None })
    }
}

struct LogMatch;

impl MatchStarter for LogMatch {
    fn start_match(&self, handoff: MatchHandoff) {
        info!(challenge = %handoff.challenge_id.short_code(), arena = %handoff.arena, players = handoff.roster.len(), "match handed off");
    }
}

/// Next event, skipping past any the receiver fell behind on. `None` once
/// every sender is gone.
async fn next_event(events: &mut broadcast::Receiver<WarEvent>) -> Option<WarEvent> {
    loop {
        match events.recv().await {
            Ok(event) => return Some(event),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "event stream lagged"),
            Err(RecvError::Closed) => return None,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(if cli.json_logs { LogFormat::Json } else { LogFormat::Human }, cli.verbose);

    let settings = match cli.settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let join_window = settings.join_time_secs;
    let tick = settings.tick_period();

    let registry = match ChallengeRegistry::new(settings, Arc::new(LogNotifier), Arc::new(AllOnline), Arc::new(LogMatch)) {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let arena = ArenaId::new("arena-1");
    if let Err(e) = registry.add_arena(arena.clone()) {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }
    let mut events = registry.subscribe();
    let scheduler = WarScheduler::new(registry.clone());

    let war_id = match scheduler.issue_war(GuildId::new_v4(), GuildId::new_v4(), arena) {
        Ok(war) => war.id(),
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    for side in Side::ALL {
        for _ in 0..cli.players {
            // Some joins land after the window closes.
            let delay = tick * rng.gen_range(0..join_window + 1) + Duration::from_millis(rng.gen_range(0..50));
            let registry = registry.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Err(e) = registry.join_challenge(war_id, PlayerId::new_v4(), side) {
                    warn!(%side, "join refused: {e}");
                }
            });
        }
    }

    while let Some(event) = next_event(&mut events).await {
        match serde_json::to_string(&event) {
            Ok(line) => println!("{line}"),
            Err(e) => error!("unprintable event: {e}"),
        }
        match event {
            WarEvent::MatchStarted { challenge_id, .. } => {
                registry.finish_challenge(challenge_id);
            }
            WarEvent::Removed { .. } => break,
            _ => {}
        }
    }
    ExitCode::SUCCESS
}
