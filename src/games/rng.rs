use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_core::OsRng;
use std::collections::VecDeque;

// Uniform draws for the outcome engine. Outcomes are not settlement-critical,
// so no verifiable randomness is required here.

/// Source of independent uniform draws
pub trait RandomSource {
    /// Uniform index in `0..upper`; `upper` is never zero
    fn next_index(&mut self, upper: usize) -> usize;

    fn next_bit(&mut self) -> bool {
        self.next_index(2) == 1
    }
}

/// `rand` backed source, OS-seeded or seeded for reproducible simulation
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    /// Seed from the OS generator; fails when the OS source is unavailable
    pub fn from_os() -> Result<Self, rand::Error> {
        let rng = StdRng::from_rng(OsRng)?;
        Ok(Self { rng })
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for StdRandom {
    fn next_index(&mut self, upper: usize) -> usize {
        self.rng.gen_range(0..upper)
    }
}

/// Replays a fixed list of draws, each reduced modulo the requested range
///
/// Panics when exhausted; meant for tests and replaying recorded rounds.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    draws: VecDeque<usize>,
}

impl ScriptedRandom {
    pub fn new(draws: impl IntoIterator<Item = usize>) -> Self {
        Self {
            draws: draws.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.draws.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn next_index(&mut self, upper: usize) -> usize {
        let draw = self
            .draws
            .pop_front()
            .unwrap_or_else(|| panic!("scripted randomness exhausted (range 0..{})", upper));
        draw % upper
    }
}
