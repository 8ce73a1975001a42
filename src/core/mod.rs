//! Core deterministic primitives.
//!
//! Everything the game layer needs that has no game rules in it:
//! coordinates, seeded randomness and state hashing.

pub mod grid;
pub mod rng;
pub mod hash;

// Re-export core types
pub use grid::{Direction, GridPos};
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash, StateHasher};
