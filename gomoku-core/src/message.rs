//! Protocol messages and their text form.
//!
//! One message per line:
//!
//! ```text
//! MOVE <x> <y>     ; 0 <= x, y < 15, where the sender placed
//! NEWGAME          ; reset board, turn and winner
//! ```
//!
//! There are no acknowledgements; the protocol is a pure notification
//! stream. Parsing uses `FromStr` and never panics on peer input.

use std::fmt;
use std::str::FromStr;

use crate::board::BOARD_SIZE;
use crate::error::ProtocolError;

const VERB_MOVE: &str = "MOVE";
const VERB_NEW_GAME: &str = "NEWGAME";

// ── Message ──────────────────────────────────────────────────────

/// A decoded protocol line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Message {
    /// The sender placed a stone at column `x`, row `y`.
    Move { x: usize, y: usize },
    /// The sender reset its game and asks the receiver to do the same.
    NewGame,
}

impl Message {
    /// The protocol verb for this message.
    pub fn verb(&self) -> &'static str {
        match self {
            Message::Move { .. } => VERB_MOVE,
            Message::NewGame => VERB_NEW_GAME,
        }
    }
}

/// Formats the line without its trailing newline.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Move { x, y } => write!(f, "{VERB_MOVE} {x} {y}"),
            Message::NewGame => write!(f, "{VERB_NEW_GAME}"),
        }
    }
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(ProtocolError::Empty)?;

        let message = match verb {
            VERB_MOVE => {
                let x = parse_coordinate(words.next(), VERB_MOVE)?;
                let y = parse_coordinate(words.next(), VERB_MOVE)?;
                Message::Move { x, y }
            }
            VERB_NEW_GAME => Message::NewGame,
            other => return Err(ProtocolError::UnknownVerb(other.to_string())),
        };

        if let Some(extra) = words.next() {
            return Err(ProtocolError::TrailingArgument {
                verb: message.verb(),
                extra: extra.to_string(),
            });
        }
        Ok(message)
    }
}

fn parse_coordinate(word: Option<&str>, verb: &'static str) -> Result<usize, ProtocolError> {
    let word = word.ok_or(ProtocolError::MissingArgument { verb })?;
    let value: i64 = word
        .parse()
        .map_err(|_| ProtocolError::InvalidCoordinate(word.to_string()))?;
    usize::try_from(value)
        .ok()
        .filter(|&v| v < BOARD_SIZE)
        .ok_or(ProtocolError::CoordinateOutOfRange(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_encodes_as_text() {
        let msg = Message::Move { x: 7, y: 3 };
        assert_eq!(msg.to_string(), "MOVE 7 3");
        assert_eq!("MOVE 7 3".parse::<Message>(), Ok(msg));
    }

    #[test]
    fn new_game_encodes_as_text() {
        assert_eq!(Message::NewGame.to_string(), "NEWGAME");
        assert_eq!("NEWGAME".parse::<Message>(), Ok(Message::NewGame));
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        assert_eq!(
            "  MOVE   0\t14 \r".parse::<Message>(),
            Ok(Message::Move { x: 0, y: 14 })
        );
    }

    #[test]
    fn rejects_unknown_verb() {
        assert_eq!(
            "JUMP 1 2".parse::<Message>(),
            Err(ProtocolError::UnknownVerb("JUMP".into()))
        );
        // Verbs are case-sensitive.
        assert!(matches!(
            "move 1 2".parse::<Message>(),
            Err(ProtocolError::UnknownVerb(_))
        ));
    }

    #[test]
    fn rejects_empty_line() {
        assert_eq!("".parse::<Message>(), Err(ProtocolError::Empty));
        assert_eq!("   ".parse::<Message>(), Err(ProtocolError::Empty));
    }

    #[test]
    fn rejects_bad_coordinates() {
        assert_eq!(
            "MOVE a 2".parse::<Message>(),
            Err(ProtocolError::InvalidCoordinate("a".into()))
        );
        assert_eq!(
            "MOVE 1.5 2".parse::<Message>(),
            Err(ProtocolError::InvalidCoordinate("1.5".into()))
        );
        assert_eq!(
            "MOVE 1".parse::<Message>(),
            Err(ProtocolError::MissingArgument { verb: "MOVE" })
        );
        assert_eq!(
            "MOVE 15 0".parse::<Message>(),
            Err(ProtocolError::CoordinateOutOfRange(15))
        );
        assert_eq!(
            "MOVE 0 -1".parse::<Message>(),
            Err(ProtocolError::CoordinateOutOfRange(-1))
        );
    }

    #[test]
    fn rejects_trailing_arguments() {
        assert!(matches!(
            "MOVE 1 2 3".parse::<Message>(),
            Err(ProtocolError::TrailingArgument { verb: "MOVE", .. })
        ));
        assert!(matches!(
            "NEWGAME now".parse::<Message>(),
            Err(ProtocolError::TrailingArgument { verb: "NEWGAME", .. })
        ));
    }
}
