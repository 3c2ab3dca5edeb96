mod assignment;
mod game;
mod participant;

pub mod types;

pub use assignment::{Pairing, SantaAssignment};
pub use game::{Game, GameStatus};
pub use participant::Participant;
