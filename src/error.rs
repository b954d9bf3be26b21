use std::path::PathBuf;
use serde::{Serialize, Deserialize};
use thiserror::Error;
use crate::ids::{ArenaId, ChallengeId, GuildId, PlayerId};
use crate::session::Side;

/// Broad class of a rejected request. Every class is recoverable at the call
/// boundary except `Internal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Conflict,
    State,
    Duplicate,
    ResourceBusy,
    NotFound,
    Internal,
}

/// Errors from challenge operations.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ChallengeError {
    #[error("A guild cannot challenge itself")]
    SelfChallenge,
    #[error("Guild {0} is already engaged in a war")]
    GuildEngaged(GuildId),
    #[error("Player {0} is already taking part in another war")]
    PlayerEngaged(PlayerId),
    #[error("The {0} side is full")]
    SideFull(Side),
    #[error("Arena {0} is already in use")]
    ArenaBusy(ArenaId),
    #[error("Arena {0} does not exist")]
    UnknownArena(ArenaId),
    #[error("Challenge is no longer accepting joins")]
    NotJoinable,
    #[error("Player {0} has already joined this war")]
    AlreadyJoined(PlayerId),
    #[error("Challenge not found")]
    NotFound,
    #[error("Internal lock error")]
    LockError,
}

impl ChallengeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChallengeError::SelfChallenge
            | ChallengeError::GuildEngaged(_)
            | ChallengeError::PlayerEngaged(_)
            | ChallengeError::SideFull(_) => ErrorKind::Conflict,
            ChallengeError::ArenaBusy(_) => ErrorKind::ResourceBusy,
            ChallengeError::NotJoinable => ErrorKind::State,
            ChallengeError::AlreadyJoined(_) => ErrorKind::Duplicate,
            ChallengeError::UnknownArena(_) | ChallengeError::NotFound => ErrorKind::NotFound,
            ChallengeError::LockError => ErrorKind::Internal,
        }
    }
}

/// Errors from arena reservation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaError {
    #[error("Arena {arena} is held by challenge {holder}")]
    Busy { arena: ArenaId, holder: ChallengeId },
}

impl From<ArenaError> for ChallengeError {
    fn from(err: ArenaError) -> Self {
        match err {
            ArenaError::Busy { arena, .. } => ChallengeError::ArenaBusy(arena),
        }
    }
}

/// Errors from loading or validating war settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntest::test_case;
    use uuid::Uuid;

    #[test_case("SelfChallenge", "conflict")]
    #[test_case("GuildEngaged", "conflict")]
    #[test_case("PlayerEngaged", "conflict")]
    #[test_case("SideFull", "conflict")]
    #[test_case("ArenaBusy", "resource_busy")]
    #[test_case("UnknownArena", "not_found")]
    #[test_case("NotJoinable", "state")]
    #[test_case("AlreadyJoined", "duplicate")]
    #[test_case("NotFound", "not_found")]
    #[test_case("LockError", "internal")]
    fn challenge_error_kind(variant_name: &str, expected: &str) {
        let err = match variant_name {
            "SelfChallenge" => ChallengeError::SelfChallenge,
            "GuildEngaged" => ChallengeError::GuildEngaged(GuildId(Uuid::nil())),
            "PlayerEngaged" => ChallengeError::PlayerEngaged(PlayerId(Uuid::nil())),
            "SideFull" => ChallengeError::SideFull(Side::Defender),
            "ArenaBusy" => ChallengeError::ArenaBusy(ArenaId::new("pit")),
            "UnknownArena" => ChallengeError::UnknownArena(ArenaId::new("pit")),
            "NotJoinable" => ChallengeError::NotJoinable,
            "AlreadyJoined" => ChallengeError::AlreadyJoined(PlayerId(Uuid::nil())),
            "NotFound" => ChallengeError::NotFound,
            "LockError" => ChallengeError::LockError,
            _ => unreachable!(),
        };
        let kind = serde_json::to_string(&err.kind()).unwrap();
        assert_eq!(kind, format!("\"{}\"", expected), "{} mapped to {}", variant_name, kind);
    }

    #[test]
    fn test_challenge_error_display() {
        assert_eq!(ChallengeError::NotJoinable.to_string(), "Challenge is no longer accepting joins");
        assert_eq!(ChallengeError::ArenaBusy(ArenaId::new("pit")).to_string(), "Arena pit is already in use");
        assert_eq!(ChallengeError::SideFull(Side::Challenger).to_string(), "The challenger side is full");
        assert_eq!(ChallengeError::LockError.to_string(), "Internal lock error");
    }

    #[test]
    fn test_arena_error_converts_to_busy() {
        let err = ArenaError::Busy { arena: ArenaId::new("pit"), holder: ChallengeId(Uuid::nil()) };
        assert_eq!(ChallengeError::from(err), ChallengeError::ArenaBusy(ArenaId::new("pit")));
    }

    #[test]
    fn test_challenge_error_serde() {
        let err = ChallengeError::GuildEngaged(GuildId(Uuid::nil()));
        let json = serde_json::to_string(&err).unwrap();
        let back: ChallengeError = serde_json::from_str(&json).unwrap();
        assert_eq!(back, err);
    }
}
