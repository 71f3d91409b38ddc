//! Match Registry
//!
//! Owns every match in the process, split into a live set (eligible for
//! simulation) and a finished set (read-only archive). Each match sits
//! behind its own lock so the scheduler can step one match while protocol
//! handlers snapshot others.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::core::rng::SimRng;
use crate::game::state::{CreateMatchError, CreateMatchParams, MatchId, MatchState};

/// Shared handle to one match's state.
pub type SharedMatch = Arc<RwLock<MatchState>>;

/// Live/finished store for all matches.
#[derive(Default)]
pub struct MatchRegistry {
    live: RwLock<BTreeMap<MatchId, SharedMatch>>,
    finished: RwLock<BTreeMap<MatchId, SharedMatch>>,
}

impl MatchRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate parameters, build the match, and place it in the live set.
    /// Returns a snapshot of the newly created state.
    pub async fn create(
        &self,
        params: CreateMatchParams,
        rng: &mut SimRng,
    ) -> Result<MatchState, CreateMatchError> {
        let state = MatchState::new(params, rng)?;
        let snapshot = state.clone();
        let id = state.match_id;

        self.live
            .write()
            .await
            .insert(id, Arc::new(RwLock::new(state)));

        info!(match_id = %id, "match created");
        Ok(snapshot)
    }

    /// Look up a match in either set.
    pub async fn find(&self, id: MatchId) -> Option<SharedMatch> {
        if let Some(m) = self.live.read().await.get(&id) {
            return Some(Arc::clone(m));
        }
        self.finished.read().await.get(&id).map(Arc::clone)
    }

    /// Ids of every live match.
    pub async fn live_ids(&self) -> Vec<MatchId> {
        self.live.read().await.keys().copied().collect()
    }

    /// Handle to a live match, if it is still live.
    pub async fn live_match(&self, id: MatchId) -> Option<SharedMatch> {
        self.live.read().await.get(&id).map(Arc::clone)
    }

    /// Move a match from the live set to the finished set.
    ///
    /// Holds both collection locks for the move so no reader can observe
    /// the match in neither set. Returns false when the id was not live,
    /// which makes a duplicate finish harmless.
    pub async fn finish(&self, id: MatchId) -> bool {
        let mut live = self.live.write().await;
        let mut finished = self.finished.write().await;
        match live.remove(&id) {
            Some(m) => {
                finished.insert(id, m);
                info!(match_id = %id, "match archived");
                true
            }
            None => false,
        }
    }

    /// Snapshots of every match, live first, then finished.
    pub async fn snapshot_all(&self) -> Vec<MatchState> {
        let live: Vec<SharedMatch> = self.live.read().await.values().cloned().collect();
        let finished: Vec<SharedMatch> = self.finished.read().await.values().cloned().collect();

        let mut out = Vec::with_capacity(live.len() + finished.len());
        for m in live.into_iter().chain(finished) {
            out.push(m.read().await.clone());
        }
        out
    }

    /// Current `(live, finished)` sizes.
    pub async fn counts(&self) -> (usize, usize) {
        (
            self.live.read().await.len(),
            self.finished.read().await.len(),
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
