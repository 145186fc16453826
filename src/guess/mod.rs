//! Guess generation for the Davidson iterations

pub mod guess;

pub use self::guess::{detseeds, generate_guess, model_guess, ras_guess};
