use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use sqids::Sqids;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new_v4() -> Self {
                $name(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                $name(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(
    /// Identifies a guild. Guild membership and roles live outside this crate.
    GuildId
);

uuid_id!(
    /// Identifies a player (the host's account id).
    PlayerId
);

uuid_id!(
    /// Identifies one war between two guilds.
    ChallengeId
);

impl ChallengeId {
    /// Short human-friendly code, suitable for chat messages and commands.
    pub fn short_code(&self) -> String {
        uuid_to_short_id(self.0)
    }

    pub fn from_short_code(code: &str) -> Option<Self> {
        short_id_to_uuid(code).map(ChallengeId)
    }
}

/// Name of a configured arena.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArenaId(pub String);

impl ArenaId {
    pub fn new(name: impl Into<String>) -> Self {
        ArenaId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ArenaId {
    fn from(name: &str) -> Self {
        ArenaId(name.to_string())
    }
}

impl FromStr for ArenaId {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(());
        }
        Ok(ArenaId(trimmed.to_string()))
    }
}

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn sqids_instance() -> Option<Sqids> {
    Sqids::builder().min_length(6).build().ok()
}

pub fn uuid_to_short_id(uuid: Uuid) -> String {
    let bytes = uuid.as_bytes();
    let mut high = [0u8; 8];
    let mut low = [0u8; 8];
    high.copy_from_slice(&bytes[0..8]);
    low.copy_from_slice(&bytes[8..16]);
    sqids_instance()
        .and_then(|s| s.encode(&[u64::from_be_bytes(high), u64::from_be_bytes(low)]).ok())
        .unwrap_or_else(|| uuid.simple().to_string())
}

pub fn short_id_to_uuid(short_id: &str) -> Option<Uuid> {
    let nums = sqids_instance()?.decode(short_id);
    if nums.len() != 2 {
        return None;
    }
    let mut bytes = [0u8; 16];
    bytes[0..8].copy_from_slice(&nums[0].to_be_bytes());
    bytes[8..16].copy_from_slice(&nums[1].to_be_bytes());
    Some(Uuid::from_bytes(bytes))
}
