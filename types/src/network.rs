//! Network identifier.

use serde::{Deserialize, Serialize};

/// Identifies which chain a node follows. Each network has its own genesis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// The production network.
    Live,
    /// The public test network.
    Test,
    /// Local development network.
    Dev,
}

impl NetworkId {
    /// Magic number mixed into the genesis block so chains never collide.
    pub fn magic(&self) -> u32 {
        match self {
            Self::Live => 0x0074_6e41,
            Self::Test => 0x0074_7441,
            Self::Dev => 0x0076_6544,
        }
    }

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Test => "test",
            Self::Dev => "dev",
        }
    }
}
