//! Simulation Scheduler
//!
//! The only writer of match state. Sleeps a random interval, picks one
//! random live match, drives a single simulation step under that match's
//! write lock, and turns the step's notices into broadcasts. When a step
//! concludes a match the scheduler archives it before announcing the
//! finish, so subscribers never see a finished match listed as live.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::core::rng::SimRng;
use crate::game::step::{simulate_step, StepNotice};
use crate::sim::broadcast::{Broadcaster, Notification};
use crate::sim::registry::MatchRegistry;

/// Scheduler timing knobs.
#[derive(Clone, Copy, Debug)]
pub struct SchedulerConfig {
    /// Smallest sleep between ticks, in milliseconds (inclusive).
    pub min_interval_ms: u64,
    /// Largest sleep between ticks, in milliseconds (exclusive).
    pub max_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 1_000,
            max_interval_ms: 10_000,
        }
    }
}

/// Drives all live matches with randomized pacing.
pub struct Scheduler {
    registry: Arc<MatchRegistry>,
    broadcaster: Broadcaster,
    rng: SimRng,
    config: SchedulerConfig,
}

impl Scheduler {
    /// Create a scheduler over the given registry and broadcast channel.
    pub fn new(
        registry: Arc<MatchRegistry>,
        broadcaster: Broadcaster,
        rng: SimRng,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            registry,
            broadcaster,
            rng,
            config,
        }
    }

    /// Run forever. Intended to be spawned as its own task.
    pub async fn run(mut self) {
        info!(
            min_ms = self.config.min_interval_ms,
            max_ms = self.config.max_interval_ms,
            "simulation scheduler started"
        );
        loop {
            let sleep_ms = self
                .rng
                .range_u64(self.config.min_interval_ms, self.config.max_interval_ms);
            tokio::time::sleep(Duration::from_millis(sleep_ms)).await;
            self.tick_once().await;
        }
    }

    /// One scheduling decision: pick a live match and advance it a step.
    /// An empty live set is skipped without noise.
    pub async fn tick_once(&mut self) {
        let ids = self.registry.live_ids().await;
        if ids.is_empty() {
            return;
        }
        let id = ids[self.rng.next_index(ids.len())];

        let Some(handle) = self.registry.live_match(id).await else {
            // Archived between listing and lookup
            return;
        };

        let notices = {
            let mut state = handle.write().await;
            simulate_step(&mut state, &mut self.rng, Utc::now().timestamp_millis())
        };

        for notice in notices {
            match notice {
                StepNotice::Update(snapshot) => {
                    self.broadcaster
                        .publish(Notification::MatchUpdate(snapshot));
                }
                StepNotice::Finished(snapshot) => {
                    self.registry.finish(snapshot.match_id).await;
                    debug!(match_id = %snapshot.match_id, "match finished");
                    self.broadcaster
                        .publish(Notification::MatchFinished(snapshot));
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
