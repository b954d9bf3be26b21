use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;
use crate::error::ChallengeError;
use crate::ids::{ArenaId, ChallengeId, GuildId};
use crate::registry::{ChallengeRegistry, TickOutcome};
use crate::session::ChallengeSession;

/// Spawns one tokio task per war that ticks it through its countdowns.
#[derive(Clone)]
pub struct WarScheduler {
    registry: ChallengeRegistry,
}

impl WarScheduler {
    pub fn new(registry: ChallengeRegistry) -> Self {
        WarScheduler { registry }
    }

    pub fn registry(&self) -> &ChallengeRegistry {
        &self.registry
    }

    /// Create a war and start its join countdown. The first countdown tick
    /// is announced right away.
    pub fn issue_war(
        &self,
        challenger: GuildId,
        defender: GuildId,
        arena: ArenaId,
    ) -> Result<ChallengeSession, ChallengeError> {
        let session = self.registry.create_challenge(challenger, defender, arena)?;
        self.drive(session.id());
        Ok(session)
    }

    /// Start ticking an already registered war. Returns false if the war
    /// is unknown, already started, or already has a driver. The task ends
    /// on its own once the war starts or is aborted, and is aborted by
    /// `remove_challenge` if the war is cancelled first.
    pub fn drive(&self, challenge_id: ChallengeId) -> bool {
        if !self.registry.reserve_driver(challenge_id) {
            debug!(challenge = %challenge_id.short_code(), "war already driven");
            return false;
        }
        let registry = self.registry.clone();
        let period = registry.settings().tick_period();
        let handle = tokio::spawn(run_war(registry, challenge_id, period));
        self.registry.attach_driver(challenge_id, handle);
        true
    }
}

async fn run_war(registry: ChallengeRegistry, challenge_id: ChallengeId, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match registry.tick(challenge_id) {
            // The ready countdown's first tick follows immediately.
            TickOutcome::Advanced => ticker.reset_immediately(),
            outcome if outcome.is_terminal() => {
                debug!(challenge = %challenge_id.short_code(), ?outcome, "war driver stopped");
                break;
            }
            _ => {}
        }
    }
}
