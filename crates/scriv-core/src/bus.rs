//! Producer/consumer event bus
//!
//! A producer exposes the [`EventBus`] capability; consumers implement
//! [`Listener`] and subscribe to the levels the producer has enabled.
//! Delivery is synchronous and in publish order, so every listener sees
//! the packets of one producer in the order they were emitted.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::level::{LevelFlags, LogLevel};
use crate::record::Packet;

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Allocate a process-unique id
    pub fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Receiving end of a bus subscription
///
/// Each listener receives its own copy of the packet and may claim it.
pub trait Listener: Send + Sync {
    fn id(&self) -> ListenerId;

    fn on_packet(&self, packet: Packet);
}

/// Subscribe/unsubscribe/publish capability of a producer
pub trait EventBus: Send + Sync {
    /// Name stamped into the `from` field of published packets
    fn name(&self) -> &str;

    /// Levels this bus will ever publish
    fn level_flags(&self) -> LevelFlags;

    fn subscribe(&self, level: LogLevel, listener: Arc<dyn Listener>);

    /// Remove a listener from a level. Unknown listeners are ignored.
    fn unsubscribe(&self, level: LogLevel, listener: ListenerId);

    fn publish(&self, level: LogLevel, packet: &Packet);
}

type Slot = Vec<Arc<dyn Listener>>;

/// Per-level listener lists backing a bus
#[derive(Default)]
pub struct ListenerRegistry {
    slots: RwLock<[Slot; 6]>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn index(level: LogLevel) -> usize {
        LogLevel::ALL
            .iter()
            .position(|candidate| *candidate == level)
            .unwrap_or_default()
    }

    /// Register a listener; registering the same id twice is a no-op
    pub fn add(&self, level: LogLevel, listener: Arc<dyn Listener>) {
        let mut slots = self.slots.write();
        let slot = &mut slots[Self::index(level)];
        if slot.iter().any(|existing| existing.id() == listener.id()) {
            return;
        }
        slot.push(listener);
    }

    /// Remove a listener; returns whether it was registered
    pub fn remove(&self, level: LogLevel, id: ListenerId) -> bool {
        let mut slots = self.slots.write();
        let slot = &mut slots[Self::index(level)];
        let before = slot.len();
        slot.retain(|existing| existing.id() != id);
        slot.len() != before
    }

    pub fn listener_count(&self, level: LogLevel) -> usize {
        self.slots.read()[Self::index(level)].len()
    }

    /// Deliver a copy of the packet to every listener of the level
    pub fn dispatch(&self, level: LogLevel, packet: &Packet) {
        // Snapshot so listeners may (un)subscribe while being called
        let listeners: Slot = self.slots.read()[Self::index(level)].clone();
        for listener in listeners {
            listener.on_packet(packet.clone());
        }
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.read();
        let mut map = f.debug_map();
        for (level, slot) in LogLevel::ALL.iter().zip(slots.iter()) {
            map.entry(&level.as_str(), &slot.len());
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LogRecord;
    use parking_lot::Mutex;

    struct Recorder {
        id: ListenerId,
        seen: Mutex<Vec<Packet>>,
    }

    impl Recorder {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                id: ListenerId::next(),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl Listener for Recorder {
        fn id(&self) -> ListenerId {
            self.id
        }

        fn on_packet(&self, packet: Packet) {
            self.seen.lock().push(packet);
        }
    }

    fn packet(text: &str) -> Packet {
        Packet::new(LogRecord::new(LogLevel::Info, text.into()), "test")
    }

    #[test]
    fn test_listener_ids_are_unique() {
        assert_ne!(ListenerId::next(), ListenerId::next());
    }

    #[test]
    fn test_dispatch_reaches_only_level_listeners() {
        let registry = ListenerRegistry::new();
        let info = Recorder::new();
        let error = Recorder::new();
        registry.add(LogLevel::Info, info.clone());
        registry.add(LogLevel::Error, error.clone());

        registry.dispatch(LogLevel::Info, &packet("a"));

        assert_eq!(info.seen.lock().len(), 1);
        assert!(error.seen.lock().is_empty());
    }

    #[test]
    fn test_duplicate_add_is_ignored() {
        let registry = ListenerRegistry::new();
        let listener = Recorder::new();
        registry.add(LogLevel::Info, listener.clone());
        registry.add(LogLevel::Info, listener.clone());
        assert_eq!(registry.listener_count(LogLevel::Info), 1);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let registry = ListenerRegistry::new();
        let kept = Recorder::new();
        registry.add(LogLevel::Info, kept.clone());

        assert!(!registry.remove(LogLevel::Info, ListenerId::next()));
        assert_eq!(registry.listener_count(LogLevel::Info), 1);
    }

    #[test]
    fn test_dispatch_preserves_order() {
        let registry = ListenerRegistry::new();
        let listener = Recorder::new();
        registry.add(LogLevel::Info, listener.clone());

        for i in 0..20 {
            registry.dispatch(LogLevel::Info, &packet(&i.to_string()));
        }

        let seen: Vec<String> = listener
            .seen
            .lock()
            .iter()
            .map(|p| p.record.payload.values()[0].as_str().unwrap().to_string())
            .collect();
        let expected: Vec<String> = (0..20).map(|i| i.to_string()).collect();
        assert_eq!(seen, expected);
    }
}
