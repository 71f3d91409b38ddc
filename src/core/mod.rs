//! Core primitives shared across the simulation.
//!
//! Everything here is transport-agnostic: the random source is injectable
//! so simulation behavior can be replayed exactly under test.

pub mod rng;

// Re-export core types
pub use rng::SimRng;
