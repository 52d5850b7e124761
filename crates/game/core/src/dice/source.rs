use std::collections::VecDeque;

use crate::config::CombatConfig;
use crate::env::{PcgRng, RngOracle, compute_seed};

/// Supplies ten-sided die faces to the dice engine.
pub trait DiceSource: Send {
    /// Returns one face in `1..=10`.
    fn roll_d10(&mut self) -> u8;

    fn roll_many(&mut self, count: u32) -> Vec<u8> {
        (0..count).map(|_| self.roll_d10()).collect()
    }
}

/// Seeded source backed by an [`RngOracle`]; each draw advances a nonce.
#[derive(Clone, Debug)]
pub struct SeededDice<R: RngOracle = PcgRng> {
    rng: R,
    seed: u64,
    stream: u32,
    nonce: u64,
}

impl SeededDice<PcgRng> {
    pub fn new(seed: u64) -> Self {
        Self::with_rng(PcgRng, seed, 0)
    }
}

impl<R: RngOracle> SeededDice<R> {
    pub fn with_rng(rng: R, seed: u64, stream: u32) -> Self {
        Self {
            rng,
            seed,
            stream,
            nonce: 0,
        }
    }

    /// Number of faces drawn so far.
    pub fn draws(&self) -> u64 {
        self.nonce
    }
}

impl<R: RngOracle> DiceSource for SeededDice<R> {
    fn roll_d10(&mut self) -> u8 {
        let seed = compute_seed(self.seed, self.nonce, self.stream, 0);
        self.nonce += 1;
        self.rng.roll_die(seed, CombatConfig::DIE_FACES as u32) as u8
    }
}

/// Replays a scripted list of faces, then keeps returning `fallback`.
///
/// Used for replays and for tests that need exact rolls.
#[derive(Clone, Debug, Default)]
pub struct FixedDice {
    faces: VecDeque<u8>,
    fallback: u8,
}

impl FixedDice {
    pub fn new(faces: impl IntoIterator<Item = u8>) -> Self {
        Self {
            faces: faces.into_iter().collect(),
            fallback: 1,
        }
    }

    pub fn with_fallback(mut self, face: u8) -> Self {
        self.fallback = face.clamp(1, CombatConfig::DIE_FACES);
        self
    }

    pub fn push(&mut self, faces: impl IntoIterator<Item = u8>) {
        self.faces.extend(faces);
    }

    pub fn remaining(&self) -> usize {
        self.faces.len()
    }
}

impl DiceSource for FixedDice {
    fn roll_d10(&mut self) -> u8 {
        self.faces
            .pop_front()
            .unwrap_or(self.fallback)
            .clamp(1, CombatConfig::DIE_FACES)
    }
}
