//! Host and Guest session roles.

use std::fmt;

use crate::board::Stone;

/// Which end of the connection this process is.
///
/// Fixed when the connection is established and never changes while
/// it lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Listens for the peer and plays Black, moving first.
    Host,
    /// Connects to the host and plays White.
    Guest,
}

impl Role {
    /// The colour this role places.
    pub fn stone(self) -> Stone {
        match self {
            Role::Host => Stone::Black,
            Role::Guest => Stone::White,
        }
    }

    /// The colour the peer places.
    pub fn opponent_stone(self) -> Stone {
        self.stone().opponent()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => write!(f, "Host"),
            Role::Guest => write!(f, "Guest"),
        }
    }
}
