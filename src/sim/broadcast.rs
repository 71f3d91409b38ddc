//! Simulation Broadcast Channel
//!
//! Fan-out of simulation events to every connected session. Publishing is
//! fire-and-forget: a send with no subscribers is not an error, and a slow
//! subscriber lags on its own receiver without slowing the scheduler down.

use tokio::sync::broadcast;

use crate::game::state::MatchState;

/// An event fanned out to all subscribed sessions. Carries a full state
/// snapshot so subscribers never need to chase the registry.
#[derive(Clone, Debug)]
pub enum Notification {
    /// A match's state changed.
    MatchUpdate(MatchState),
    /// A match just concluded.
    MatchFinished(MatchState),
}

/// Cloneable publish handle over a broadcast channel.
#[derive(Clone)]
pub struct Broadcaster {
    sender: broadcast::Sender<Notification>,
}

impl Broadcaster {
    /// Create a broadcaster with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Open a new subscription. Only events published after this call are
    /// delivered.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Publish to every current subscriber. Having none is fine.
    pub fn publish(&self, notification: Notification) {
        let _ = self.sender.send(notification);
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

// =============================================================================
// TESTS
// =============================================================================
