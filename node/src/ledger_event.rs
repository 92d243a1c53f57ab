//! Events emitted by the ingestion components for subscribers.

use std::sync::{Arc, RwLock};

use strata_types::{Block, BlockHeader};

/// Notifications raised by the pool, the processor and the header persister.
#[derive(Clone, Debug)]
pub enum LedgerEvent {
    /// A block was accepted into the block pool.
    BlockAdded(Arc<Block>),
    /// A block was persisted and the processed height advanced to it.
    BlockProcessed(Arc<Block>),
    /// A batch of headers was committed, in index order.
    HeadersPersisted(Vec<BlockHeader>),
}

type Listener = Box<dyn Fn(&LedgerEvent) + Send + Sync>;

/// Synchronous fan-out event bus.
///
/// Each publishing component owns its own bus. Listeners are invoked inline
/// on the emitting task; keep handlers fast to avoid stalling persistence.
pub struct EventBus {
    listeners: RwLock<Vec<Listener>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&LedgerEvent) + Send + Sync + 'static) {
        self.listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Box::new(listener));
    }

    pub fn emit(&self, event: &LedgerEvent) {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for listener in listeners.iter() {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .map(|l| l.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use strata_types::{BlockHash, Timestamp};

    fn block() -> Arc<Block> {
        Arc::new(Block::new(1, BlockHash::ZERO, Timestamp::new(10), vec![]))
    }

    #[test]
    fn emit_calls_all_listeners() {
        let counter = Arc::new(AtomicUsize::new(0));
        let bus = EventBus::new();

        let c1 = Arc::clone(&counter);
        bus.subscribe(move |_| {
            c1.fetch_add(1, Ordering::SeqCst);
        });
        let c2 = Arc::clone(&counter);
        bus.subscribe(move |_| {
            c2.fetch_add(10, Ordering::SeqCst);
        });

        bus.emit(&LedgerEvent::BlockAdded(block()));
        assert_eq!(counter.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn emit_with_no_listeners_is_noop() {
        let bus = EventBus::default();
        assert_eq!(bus.listener_count(), 0);
        bus.emit(&LedgerEvent::HeadersPersisted(vec![]));
    }

    #[test]
    fn listener_receives_correct_event_variant() {
        let processed = Arc::new(AtomicUsize::new(0));
        let bus = EventBus::new();

        let p = Arc::clone(&processed);
        bus.subscribe(move |event| {
            if let LedgerEvent::BlockProcessed(block) = event {
                p.fetch_add(block.index as usize, Ordering::SeqCst);
            }
        });

        bus.emit(&LedgerEvent::BlockAdded(block()));
        bus.emit(&LedgerEvent::BlockProcessed(block()));
        assert_eq!(processed.load(Ordering::SeqCst), 1);
    }
}
