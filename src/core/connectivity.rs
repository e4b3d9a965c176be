//! Connectivity signal supplied by the host.
//!
//! Nothing in this crate watches the network. Callers pass the last known
//! state in, and drains are triggered from outside.

use serde::{Deserialize, Serialize};

/// Last known reachability of the remote store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// The remote store is believed reachable.
    #[default]
    Online,
    /// The remote store is known to be unreachable.
    Offline,
}

impl Connectivity {
    /// Whether a remote call is worth attempting.
    #[must_use]
    pub const fn is_online(self) -> bool {
        matches!(self, Self::Online)
    }
}

impl From<bool> for Connectivity {
    fn from(online: bool) -> Self {
        if online {
            Self::Online
        } else {
            Self::Offline
        }
    }
}
