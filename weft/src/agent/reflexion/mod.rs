//! Trial loop with self-reflection.
//!
//! Each trial writes an attempt and has it judged. A failed attempt gets a
//! short written lesson, and every later attempt sees all lessons so far.
//! The loop stops at the first success or after `max_trials`; the answer is
//! the last attempt either way.

mod nodes;
mod runner;
mod state;
mod steps;

pub use runner::ReflexionRunner;
pub use state::{ReflexionState, ReflexionUpdate};
