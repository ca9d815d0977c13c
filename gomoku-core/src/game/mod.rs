mod coordinator;
mod state;

pub use coordinator::Coordinator;
pub use state::{FIRST_TO_MOVE, GameSnapshot, GameState};

#[cfg(test)]
pub(crate) use state::draw_sequence;
