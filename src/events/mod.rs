//! Update events emitted after committed scheduling changes.
//!
//! Events carry full snapshots, not diffs, so a consumer can render state
//! without a follow-up read. Delivery is best effort: a notifier failure is
//! logged and never fails the operation that produced the event.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::matches::Match;
use crate::tournament::{Tournament, TournamentId};

/// Capacity of the broadcast channel behind [`BroadcastNotifier`]
const BROADCAST_CAPACITY: usize = 256;

/// A committed state change worth telling the outside world about
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdateEvent {
    /// Tournament state changed (status, opening pair, winner)
    TournamentUpdated { tournament: Tournament },
    /// A batch of fixtures was generated
    MatchesGenerated {
        tournament_id: TournamentId,
        matches: Vec<Match>,
    },
    /// A single match changed (result, forfeit, event)
    MatchUpdated {
        tournament_id: TournamentId,
        match_snapshot: Match,
    },
}

impl UpdateEvent {
    pub fn tournament_id(&self) -> TournamentId {
        match self {
            UpdateEvent::TournamentUpdated { tournament } => tournament.id,
            UpdateEvent::MatchesGenerated { tournament_id, .. }
            | UpdateEvent::MatchUpdated { tournament_id, .. } => *tournament_id,
        }
    }
}

/// Sink for update events.
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    async fn notify(&self, event: UpdateEvent);
}

/// Notifier that drops every event. For embedders that poll.
#[derive(Default)]
pub struct NullNotifier;

impl NullNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ChangeNotifier for NullNotifier {
    async fn notify(&self, _event: UpdateEvent) {}
}

/// Fan-out notifier over a tokio broadcast channel.
pub struct BroadcastNotifier {
    sender: broadcast::Sender<UpdateEvent>,
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender }
    }

    /// A new receiver for all future events
    pub fn subscribe(&self) -> broadcast::Receiver<UpdateEvent> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChangeNotifier for BroadcastNotifier {
    async fn notify(&self, event: UpdateEvent) {
        // send only fails when nobody is subscribed
        if let Err(e) = self.sender.send(event) {
            log::debug!("No subscribers for update event: {e}");
        }
    }
}
