//! Match Simulation Domain
//!
//! The pure heart of the server: match state, the static map and weapon
//! catalogs, and the step engine that advances a match one kill at a time.
//! Nothing in here does I/O; the `sim` layer drives it and the `network`
//! layer serializes its snapshots.

pub mod catalog;
pub mod state;
pub mod step;

pub use state::{
    CreateMatchError, CreateMatchParams, KillEvent, MatchId, MatchState, Player, PlayerId,
    RoundHistoryEntry, Side, Team, TeamParams, TeamSlot,
};
pub use step::{simulate_step, StepNotice};
