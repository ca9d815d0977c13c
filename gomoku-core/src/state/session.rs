//! Lifecycle of one play session, from the menu through a game and back.

use crate::error::GomokuError;

/// The current phase of the session.
///
/// ```text
///          ┌──► Hosting ──┐
///  Menu ───┤              ├──► Active ◄──► Finished
///   ▲ ▲    └──► Joining ──┘      │            │
///   │ └───── (failure) ◄─────────┘            │
///   └──────────── play again / teardown ◄─────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No connection; waiting for the user to pick a role.
    #[default]
    Menu,

    /// Bound and waiting for a guest.
    Hosting,

    /// Dialing a host.
    Joining,

    /// Connected and playing.
    Active,

    /// A round ended; board input is ignored.
    Finished,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Menu => write!(f, "Menu"),
            Self::Hosting => write!(f, "Hosting"),
            Self::Joining => write!(f, "Joining"),
            Self::Active => write!(f, "Active"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}

impl SessionPhase {
    /// Returns `true` while hosting or joining.
    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Hosting | Self::Joining)
    }

    /// Returns `true` while a connection and coordinator exist.
    pub fn has_game(&self) -> bool {
        matches!(self, Self::Active | Self::Finished)
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Transition to `Hosting`.
    ///
    /// Valid from: `Menu`.
    pub fn host(&mut self) -> Result<(), GomokuError> {
        match self {
            Self::Menu => {
                *self = Self::Hosting;
                Ok(())
            }
            _ => Err(GomokuError::InvalidTransition("cannot host: not in Menu")),
        }
    }

    /// Transition to `Joining`.
    ///
    /// Valid from: `Menu`.
    pub fn join(&mut self) -> Result<(), GomokuError> {
        match self {
            Self::Menu => {
                *self = Self::Joining;
                Ok(())
            }
            _ => Err(GomokuError::InvalidTransition("cannot join: not in Menu")),
        }
    }

    /// Transition to `Active`.
    ///
    /// Valid from: `Hosting`, `Joining`.
    pub fn connected(&mut self) -> Result<(), GomokuError> {
        match self {
            Self::Hosting | Self::Joining => {
                *self = Self::Active;
                Ok(())
            }
            _ => Err(GomokuError::InvalidTransition(
                "cannot start game: not connecting",
            )),
        }
    }

    /// Back to `Menu` after a failed or cancelled connection attempt.
    ///
    /// Valid from: `Hosting`, `Joining`.
    pub fn abort(&mut self) -> Result<(), GomokuError> {
        match self {
            Self::Hosting | Self::Joining => {
                *self = Self::Menu;
                Ok(())
            }
            _ => Err(GomokuError::InvalidTransition("cannot abort: not connecting")),
        }
    }

    /// Transition to `Finished`.
    ///
    /// Valid from: `Active`.
    pub fn finish(&mut self) -> Result<(), GomokuError> {
        match self {
            Self::Active => {
                *self = Self::Finished;
                Ok(())
            }
            _ => Err(GomokuError::InvalidTransition("cannot finish: not Active")),
        }
    }

    /// Transition back to `Active` for a rematch on the same connection.
    ///
    /// Valid from: `Finished`.
    pub fn rematch(&mut self) -> Result<(), GomokuError> {
        match self {
            Self::Finished => {
                *self = Self::Active;
                Ok(())
            }
            _ => Err(GomokuError::InvalidTransition("cannot rematch: not Finished")),
        }
    }

    /// Tear down to `Menu` regardless of current phase.
    pub fn reset(&mut self) {
        *self = Self::Menu;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_cycle() {
        let mut phase = SessionPhase::default();
        assert_eq!(phase, SessionPhase::Menu);

        phase.host().unwrap();
        assert!(phase.is_connecting());
        phase.connected().unwrap();
        assert_eq!(phase, SessionPhase::Active);
        phase.finish().unwrap();
        assert!(phase.has_game());
        phase.reset();
        assert_eq!(phase, SessionPhase::Menu);
    }

    #[test]
    fn failed_join_returns_to_menu() {
        let mut phase = SessionPhase::Menu;
        phase.join().unwrap();
        phase.abort().unwrap();
        assert_eq!(phase, SessionPhase::Menu);
    }

    #[test]
    fn rematch_from_finished() {
        let mut phase = SessionPhase::Finished;
        phase.rematch().unwrap();
        assert_eq!(phase, SessionPhase::Active);
    }

    #[test]
    fn invalid_transitions() {
        assert!(SessionPhase::Active.host().is_err());
        assert!(SessionPhase::Hosting.join().is_err());
        assert!(SessionPhase::Menu.connected().is_err());
        assert!(SessionPhase::Menu.finish().is_err());
        assert!(SessionPhase::Finished.finish().is_err());
        assert!(SessionPhase::Active.rematch().is_err());
        assert!(SessionPhase::Active.abort().is_err());
    }

    #[test]
    fn display_format() {
        assert_eq!(SessionPhase::Menu.to_string(), "Menu");
        assert_eq!(SessionPhase::Hosting.to_string(), "Hosting");
        assert_eq!(SessionPhase::Joining.to_string(), "Joining");
        assert_eq!(SessionPhase::Active.to_string(), "Active");
        assert_eq!(SessionPhase::Finished.to_string(), "Finished");
    }
}
