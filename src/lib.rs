//! Coordination engine for guild-vs-guild wars: one guild challenges
//! another, members of both join during a fixed window, and if both sides
//! reach quorum a ready countdown runs before the match starts in a reserved
//! arena.
//!
//! The host supplies message delivery, player presence and the match
//! routine through the [`Notifier`], [`Presence`] and [`MatchStarter`]
//! traits. [`WarScheduler`] drives each war on a tokio task; the same steps
//! can be driven by hand with [`ChallengeRegistry::tick`].
//!
//! ## Example usage
//! ```
//! use std::sync::Arc;
//! use guild_war::*;
//!
//! struct Quiet;
//!
//! impl Notifier for Quiet {
//!     fn notify(&self, _: PlayerId, _: MessageKey, _: &Substitutions) {}
//!     fn notify_guild(&self, _: GuildId, _: MessageKey, _: &Substitutions) {}
//! }
//!
//! impl Presence for Quiet {
//!     fn resolve_player(&self, player: PlayerId) -> Option<PlayerHandle> {
//!         Some(PlayerHandle { id: player, name: None })
//!     }
//! }
//!
//! impl MatchStarter for Quiet {
//!     fn start_match(&self, handoff: MatchHandoff) {
//!         println!("war {} starts with {} players", handoff.challenge_id, handoff.roster.len());
//!     }
//! }
//!
//! let settings = WarSettings { join_time_secs: 2, ready_time_secs: 1, ..WarSettings::default() };
//! let registry = ChallengeRegistry::new(settings, Arc::new(Quiet), Arc::new(Quiet), Arc::new(Quiet)).unwrap();
//! registry.add_arena(ArenaId::new("colosseum")).unwrap();
//!
//! let war = registry
//!     .create_challenge(GuildId::new_v4(), GuildId::new_v4(), ArenaId::new("colosseum"))
//!     .unwrap();
//! registry.join_challenge(war.id(), PlayerId::new_v4(), Side::Challenger).unwrap();
//! registry.join_challenge(war.id(), PlayerId::new_v4(), Side::Defender).unwrap();
//!
//! assert_eq!(registry.tick(war.id()), TickOutcome::Counting);
//! assert_eq!(registry.tick(war.id()), TickOutcome::Advanced);
//! assert_eq!(registry.tick(war.id()), TickOutcome::MatchStarted);
//! assert_eq!(registry.phase(war.id()), Some(PhaseKind::Started));
//!
//! assert!(registry.finish_challenge(war.id()));
//! assert!(!registry.arena_in_use(&ArenaId::new("colosseum")).unwrap());
//! ```

mod arena;
mod config;
mod error;
mod events;
mod ids;
mod notify;
mod registry;
mod scheduler;
mod session;

pub mod phase;

#[cfg(feature = "sim")]
pub mod logging;

#[cfg(test)]
mod testing;


pub use arena::Arena;
pub use config::WarSettings;
pub use error::{ArenaError, ChallengeError, ConfigError, ErrorKind};
pub use events::{RemovalReason, WarEvent};
pub use ids::{short_id_to_uuid, uuid_to_short_id, ArenaId, ChallengeId, GuildId, PlayerId};
pub use notify::{MatchHandoff, MatchStarter, MessageKey, Notifier, PlayerHandle, Presence, Substitutions};
pub use phase::PhaseKind;
pub use registry::{ChallengeRegistry, Quorum, TickOutcome};
pub use scheduler::WarScheduler;
pub use session::{ChallengeSession, Side};
