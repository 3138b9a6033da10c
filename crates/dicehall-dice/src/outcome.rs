//! Outcome generation: three independent uniform draws per round.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dicehall_protocol::{Color, Outcome};
use rand::Rng;

/// Produces the shared outcome for a round.
///
/// The engine calls `roll` exactly once per round and hands the same
/// value to every player. Implementations must not be consulted per
/// player.
pub trait OutcomeSource: Send + 'static {
    /// Draws the next outcome.
    fn roll(&mut self) -> Outcome;
}

/// Draws three colors uniformly, with replacement, from `rng`.
pub fn roll_outcome<R: Rng + ?Sized>(rng: &mut R) -> Outcome {
    let mut draw = || Color::ALL[rng.random_range(0..Color::ALL.len())];
    Outcome([draw(), draw(), draw()])
}

/// Production source backed by the thread-local RNG.
///
/// The RNG handle is taken per roll and never held, so the source stays
/// `Send` and can live inside the engine task.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomOutcomes;

impl OutcomeSource for RandomOutcomes {
    fn roll(&mut self) -> Outcome {
        roll_outcome(&mut rand::rng())
    }
}

/// Deterministic source that replays a fixed script, cycling when it
/// runs out, and counts how many times it was asked.
#[derive(Debug, Clone)]
pub struct ScriptedOutcomes {
    script: Vec<Outcome>,
    next: usize,
    rolls: Arc<AtomicUsize>,
}

impl ScriptedOutcomes {
    /// Creates a source from a non-empty script.
    ///
    /// An empty script falls back to a single all-yellow outcome.
    pub fn new(script: Vec<Outcome>) -> Self {
        let script = if script.is_empty() {
            vec![Outcome([Color::Yellow; 3])]
        } else {
            script
        };
        Self {
            script,
            next: 0,
            rolls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of rolls made so far. Stays readable after the
    /// source has been moved into the engine.
    pub fn roll_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.rolls)
    }
}

impl OutcomeSource for ScriptedOutcomes {
    fn roll(&mut self) -> Outcome {
        let outcome = self.script[self.next % self.script.len()];
        self.next += 1;
        self.rolls.fetch_add(1, Ordering::SeqCst);
        outcome
    }
}
