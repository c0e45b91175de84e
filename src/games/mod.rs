pub mod engine;
pub mod rng;
pub mod session;
pub mod slots;
pub mod types;
pub mod word;

pub use engine::OutcomeEngine;
pub use rng::{RandomSource, ScriptedRandom, StdRandom};
pub use session::GameSession;
pub use types::*;
pub use word::{LetterStatus, WordGameSession, WordGameStatus};
