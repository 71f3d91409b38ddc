//! # Strike Sim Server
//!
//! An authoritative match simulation server. Matches are created over a
//! WebSocket API, advanced by a randomized scheduler one kill at a time,
//! and streamed to every connected client as full state snapshots.
//!
//! ## Architecture
//!
//! - [`core`]: deterministic RNG used by everything random
//! - [`game`]: match state, catalogs, and the simulation step engine
//! - [`sim`]: match registry, broadcast fan-out, and the scheduler
//! - [`network`]: wire protocol and the WebSocket server

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;
pub mod sim;

pub use crate::core::rng::SimRng;
pub use game::{CreateMatchError, CreateMatchParams, MatchId, MatchState};
pub use network::{MatchServer, ServerConfig};
pub use sim::{Broadcaster, MatchRegistry, Scheduler, SchedulerConfig};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Round countdown starting value, in seconds.
pub const ROUND_TIMER_SECS: u32 = 90;

/// Maximum kill feed length; older entries are evicted.
pub const KILL_FEED_CAPACITY: usize = 15;

/// Round wins needed to take the match.
pub const ROUNDS_TO_WIN: u32 = 13;

/// Sides swap when this round begins.
pub const SIDE_SWAP_ROUND: u32 = 13;

/// A match ends once the round counter passes this.
pub const MAX_ROUNDS: u32 = 24;

/// Every player's starting economy balance.
pub const STARTING_MONEY: u32 = 800;
