use std::fmt;

use serde::{Deserialize, Serialize};

/// Self-reported presence of a room member.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    /// Active (the state every session starts in)
    #[default]
    Online,
    /// Idle
    Away,
    /// Do not disturb
    Busy,
}

impl PresenceStatus {
    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Away => "away",
            Self::Busy => "busy",
        }
    }
}

impl fmt::Display for PresenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
