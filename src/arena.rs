use serde::{Serialize, Deserialize};
use tracing::error;
use crate::error::ArenaError;
use crate::ids::{ArenaId, ChallengeId};

/// A reservable location. At most one challenge holds it at a time.
///
/// Only the registry calls `reserve`/`release`; sessions and phase timers
/// never touch arena state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arena {
    id: ArenaId,
    holder: Option<ChallengeId>,
}

impl Arena {
    pub fn new(id: ArenaId) -> Self {
        Arena { id, holder: None }
    }

    pub fn id(&self) -> &ArenaId {
        &self.id
    }

    pub fn is_in_use(&self) -> bool {
        self.holder.is_some()
    }

    pub fn holder(&self) -> Option<ChallengeId> {
        self.holder
    }

    /// Compare-and-set reservation: fails if any challenge (including `by`)
    /// already holds the arena.
    pub(crate) fn reserve(&mut self, by: ChallengeId) -> Result<(), ArenaError> {
        match self.holder {
            Some(holder) => Err(ArenaError::Busy { arena: self.id.clone(), holder }),
            None => {
                self.holder = Some(by);
                Ok(())
            }
        }
    }

    /// Idempotent release. Returns true if this call freed the arena.
    ///
    /// Releasing an arena held by a different challenge is a logic error in
    /// the caller; the reservation is left untouched.
    pub(crate) fn release(&mut self, by: ChallengeId) -> bool {
        match self.holder {
            Some(holder) if holder == by => {
                self.holder = None;
                true
            }
            Some(holder) => {
                error!(arena = %self.id, %holder, releaser = %by, "release of arena held by another challenge");
                debug_assert!(false, "arena {} released by non-holder", self.id);
                false
            }
            None => false,
        }
    }
}
