//! Queries answered by external collaborators.
//!
//! Pathfinding and line of sight are computed elsewhere. The engine only asks
//! synchronous questions through these traits; [`Env`] bundles them so rules
//! code can take one argument.
mod rng;

pub use rng::{PcgRng, RngOracle, compute_seed};

use crate::state::Position;

/// Answers "can this footprint get from A to B, and at what cost".
pub trait MovementOracle: Send + Sync {
    /// Returns the movement cost in tiles, or `None` when unreachable.
    fn path_cost(&self, footprint: u32, from: Position, to: Position) -> Option<u32>;
}

/// Answers line-of-sight questions between two positions.
pub trait VisibilityOracle: Send + Sync {
    fn sight(&self, from: Position, to: Position) -> Sight;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Cover {
    #[default]
    None,
    /// Removes one die from ranged attacks.
    Partial,
    /// Blocks ranged attacks entirely.
    Full,
}

impl Cover {
    pub const fn ranged_penalty(self) -> u32 {
        match self {
            Cover::None | Cover::Full => 0,
            Cover::Partial => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sight {
    pub line_of_sight: bool,
    pub cover: Cover,
}

impl Sight {
    pub const CLEAR: Self = Self {
        line_of_sight: true,
        cover: Cover::None,
    };

    pub fn can_target(&self) -> bool {
        self.line_of_sight && self.cover != Cover::Full
    }
}

/// Read-only collaborator bundle handed to catalog, validator and performer.
#[derive(Clone, Copy)]
pub struct Env<'a> {
    pub movement: &'a dyn MovementOracle,
    pub visibility: &'a dyn VisibilityOracle,
}

impl<'a> Env<'a> {
    pub fn new(movement: &'a dyn MovementOracle, visibility: &'a dyn VisibilityOracle) -> Self {
        Self {
            movement,
            visibility,
        }
    }
}

/// Open rectangular ground with no obstacles: every in-bounds tile is
/// reachable at Chebyshev cost and every pair of positions can see each other.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpenGround {
    pub width: i32,
    pub height: i32,
}

impl OpenGround {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, position: Position) -> bool {
        position.x >= 0 && position.y >= 0 && position.x < self.width && position.y < self.height
    }
}

impl MovementOracle for OpenGround {
    fn path_cost(&self, _footprint: u32, from: Position, to: Position) -> Option<u32> {
        if !self.contains(from) || !self.contains(to) {
            return None;
        }
        Some(from.distance(to))
    }
}

impl VisibilityOracle for OpenGround {
    fn sight(&self, from: Position, to: Position) -> Sight {
        if self.contains(from) && self.contains(to) {
            Sight::CLEAR
        } else {
            Sight::default()
        }
    }
}
