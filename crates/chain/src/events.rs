//! Head and log event fan-out.

use heron_primitives::{EgtxLog, VirtualBlock, VirtualTransaction};
use tokio::sync::broadcast;

/// Default capacity of each event channel. A subscriber that falls further
/// behind than this loses its oldest events rather than stalling the
/// producer.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The broadcast channels connecting the producer to its subscribers.
///
/// Cloning shares the underlying channels. Subscriptions taken before an
/// event see it; channels are bounded and drop the oldest events for a
/// lagging subscriber.
#[derive(Debug, Clone)]
pub struct EventScope {
    heads: broadcast::Sender<VirtualBlock>,
    logs: broadcast::Sender<EgtxLog>,
}

impl EventScope {
    /// Creates a scope whose channels each buffer `capacity` events.
    pub fn new(capacity: usize) -> Self {
        let (heads, _) = broadcast::channel(capacity);
        let (logs, _) = broadcast::channel(capacity);
        Self { heads, logs }
    }

    /// Subscribes to produced block heads.
    pub fn subscribe_heads(&self) -> broadcast::Receiver<VirtualBlock> {
        self.heads.subscribe()
    }

    /// Subscribes to the logs of produced blocks.
    pub fn subscribe_logs(&self) -> broadcast::Receiver<EgtxLog> {
        self.logs.subscribe()
    }

    /// Publishes a produced block and each of its logs. Publishing with no
    /// live subscribers is a no-op.
    pub fn publish_block(&self, block: &VirtualBlock, txs: &[VirtualTransaction]) {
        let _ = self.heads.send(block.clone());
        for tx in txs {
            let _ = self.logs.send(tx.log.clone());
        }
    }
}

impl Default for EventScope {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}
