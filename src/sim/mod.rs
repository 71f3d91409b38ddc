//! Simulation Runtime
//!
//! Process-level machinery around the game domain: the match registry,
//! the broadcast fan-out, and the randomized scheduler that advances live
//! matches.

pub mod broadcast;
pub mod registry;
pub mod scheduler;

pub use broadcast::{Broadcaster, Notification};
pub use registry::{MatchRegistry, SharedMatch};
pub use scheduler::{Scheduler, SchedulerConfig};
