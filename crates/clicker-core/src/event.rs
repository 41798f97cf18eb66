//! Typed notifications with listener registration and a history ring buffer.
//!
//! Events are delivered synchronously: [`EventBus::emit`] calls every
//! listener registered for the event's kind, in registration order, before
//! returning. The most recent events are also kept in an [`EventBuffer`] for
//! inspection.
//!
//! # Suppression
//!
//! Event kinds can be suppressed via [`EventBus::suppress`]. Suppressed
//! events are neither recorded nor delivered.

use crate::catalog::CurrencyAmount;
use crate::view::DerivedView;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// A state-change notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ProducerUnlocked {
        producer_id: String,
        producer_name: String,
    },
    /// Reserved. Defined for listeners but never emitted by the engine.
    UpgradeUnlocked {
        upgrade_id: String,
        upgrade_name: String,
    },
    UpgradePurchased {
        upgrade_id: String,
        /// The cost that was just paid.
        cost: Vec<CurrencyAmount>,
        new_level: u32,
    },
    AchievementUnlocked {
        achievement_id: String,
        achievement_name: String,
    },
    /// Emitted at the end of each tick cycle when someone is listening.
    GameStateChanged { state: Box<DerivedView> },
}

/// Discriminant tag for event types, used for registration and suppression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ProducerUnlocked,
    UpgradeUnlocked,
    UpgradePurchased,
    AchievementUnlocked,
    GameStateChanged,
}

/// Total number of event kinds.
const EVENT_KIND_COUNT: usize = 5;

impl Event {
    /// Get the discriminant kind for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ProducerUnlocked { .. } => EventKind::ProducerUnlocked,
            Event::UpgradeUnlocked { .. } => EventKind::UpgradeUnlocked,
            Event::UpgradePurchased { .. } => EventKind::UpgradePurchased,
            Event::AchievementUnlocked { .. } => EventKind::AchievementUnlocked,
            Event::GameStateChanged { .. } => EventKind::GameStateChanged,
        }
    }
}

impl EventKind {
    pub const ALL: [EventKind; EVENT_KIND_COUNT] = [
        EventKind::ProducerUnlocked,
        EventKind::UpgradeUnlocked,
        EventKind::UpgradePurchased,
        EventKind::AchievementUnlocked,
        EventKind::GameStateChanged,
    ];

    /// Wire name of the event, as listeners in other front ends know it.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::ProducerUnlocked => "producerUnlocked",
            EventKind::UpgradeUnlocked => "upgradeUnlocked",
            EventKind::UpgradePurchased => "upgradePurchased",
            EventKind::AchievementUnlocked => "achievementUnlocked",
            EventKind::GameStateChanged => "gameStateChanged",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer
// ---------------------------------------------------------------------------

/// A pre-allocated ring buffer for events. Fixed capacity; when full, the
/// oldest events are dropped.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<Option<Event>>,
    /// Write position (wraps around).
    head: usize,
    len: usize,
    /// Total events ever written (including dropped).
    total_written: u64,
}

impl EventBuffer {
    /// Create a new ring buffer with the given capacity.
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    /// Push an event. If full, the oldest event is dropped.
    pub fn push(&mut self, event: Event) {
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % self.capacity();
        if self.len < self.capacity() {
            self.len += 1;
        }
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Number of events that were dropped because the buffer was full.
    pub fn dropped_count(&self) -> u64 {
        self.total_written.saturating_sub(self.capacity() as u64)
    }

    /// Iterate over events in order from oldest to newest.
    pub fn iter(&self) -> EventBufferIter<'_> {
        let start = if self.len < self.capacity() {
            0
        } else {
            // head points to the next write position, which is the oldest entry
            self.head
        };
        EventBufferIter {
            buffer: self,
            index: start,
            remaining: self.len,
        }
    }

    pub fn clear(&mut self) {
        for slot in &mut self.events {
            *slot = None;
        }
        self.head = 0;
        self.len = 0;
    }
}

/// Iterator over events in an [`EventBuffer`], from oldest to newest.
pub struct EventBufferIter<'a> {
    buffer: &'a EventBuffer,
    index: usize,
    remaining: usize,
}

impl<'a> Iterator for EventBufferIter<'a> {
    type Item = &'a Event;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let event = self.buffer.events[self.index].as_ref();
        self.index = (self.index + 1) % self.buffer.capacity();
        self.remaining -= 1;
        event
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for EventBufferIter<'_> {}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// A listener receives events read-only.
pub type Listener = Box<dyn FnMut(&Event)>;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct ListenerEntry {
    id: ListenerId,
    listener: Listener,
}

impl std::fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("id", &self.id)
            .field("listener", &"<fn>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default number of recent events kept in the history buffer.
pub const DEFAULT_HISTORY_CAPACITY: usize = 256;

/// The engine's notification hub.
#[derive(Debug)]
pub struct EventBus {
    history: EventBuffer,
    suppressed: [bool; EVENT_KIND_COUNT],
    listeners: [Vec<ListenerEntry>; EVENT_KIND_COUNT],
    next_listener_id: u64,
}

impl EventBus {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            history: EventBuffer::new(history_capacity),
            suppressed: [false; EVENT_KIND_COUNT],
            listeners: Default::default(),
            next_listener_id: 0,
        }
    }

    /// Register a listener for one event kind.
    pub fn subscribe(&mut self, kind: EventKind, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_listener_id);
        self.next_listener_id += 1;
        self.listeners[kind.index()].push(ListenerEntry { id, listener });
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        for entries in &mut self.listeners {
            if let Some(pos) = entries.iter().position(|e| e.id == id) {
                entries.remove(pos);
                return true;
            }
        }
        false
    }

    /// Whether an emission of this kind would reach anyone.
    pub fn has_listeners(&self, kind: EventKind) -> bool {
        !self.suppressed[kind.index()] && !self.listeners[kind.index()].is_empty()
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners[kind.index()].len()
    }

    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
    }

    pub fn unsuppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = false;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    /// Record an event and deliver it to every listener of its kind.
    /// No-ops if the kind is suppressed.
    pub fn emit(&mut self, event: Event) {
        let idx = event.kind().index();
        if self.suppressed[idx] {
            return;
        }
        log::trace!("emit {}", event.kind().name());
        for entry in &mut self.listeners[idx] {
            (entry.listener)(&event);
        }
        self.history.push(event);
    }

    /// Recently emitted events, oldest first.
    pub fn recent(&self) -> EventBufferIter<'_> {
        self.history.iter()
    }

    pub fn history(&self) -> &EventBuffer {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn unlocked(id: &str) -> Event {
        Event::ProducerUnlocked {
            producer_id: id.to_string(),
            producer_name: id.to_uppercase(),
        }
    }

    #[test]
    fn event_buffer_push_and_iterate() {
        let mut buf = EventBuffer::new(8);
        buf.push(unlocked("a"));
        buf.push(unlocked("b"));

        assert_eq!(buf.len(), 2);
        assert_eq!(buf.total_written(), 2);
        assert_eq!(buf.dropped_count(), 0);

        let events: Vec<&Event> = buf.iter().collect();
        assert_eq!(events, vec![&unlocked("a"), &unlocked("b")]);
    }

    #[test]
    fn event_buffer_ring_wraps_and_drops_oldest() {
        let mut buf = EventBuffer::new(3);
        for id in ["a", "b", "c", "d", "e"] {
            buf.push(unlocked(id));
        }

        assert_eq!(buf.len(), 3);
        assert_eq!(buf.total_written(), 5);
        assert_eq!(buf.dropped_count(), 2);

        let ids: Vec<&Event> = buf.iter().collect();
        assert_eq!(ids, vec![&unlocked("c"), &unlocked("d"), &unlocked("e")]);
    }

    #[test]
    fn event_buffer_zero_capacity_clamped() {
        let mut buf = EventBuffer::new(0);
        assert_eq!(buf.capacity(), 1);
        buf.push(unlocked("a"));
        buf.push(unlocked("b"));
        assert_eq!(buf.iter().next(), Some(&unlocked("b")));
        buf.clear();
        assert!(buf.is_empty());
    }

    #[test]
    fn listeners_receive_only_their_kind_in_order() {
        let mut bus = EventBus::default();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l1 = log.clone();
        bus.subscribe(
            EventKind::ProducerUnlocked,
            Box::new(move |_| l1.borrow_mut().push("first")),
        );
        let l2 = log.clone();
        bus.subscribe(
            EventKind::ProducerUnlocked,
            Box::new(move |_| l2.borrow_mut().push("second")),
        );
        let l3 = log.clone();
        bus.subscribe(
            EventKind::AchievementUnlocked,
            Box::new(move |_| l3.borrow_mut().push("achievement")),
        );

        bus.emit(unlocked("mine"));
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut bus = EventBus::default();
        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        let id = bus.subscribe(
            EventKind::ProducerUnlocked,
            Box::new(move |_| *c.borrow_mut() += 1),
        );

        bus.emit(unlocked("a"));
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.emit(unlocked("b"));

        assert_eq!(*count.borrow(), 1);
        assert_eq!(bus.listener_count(EventKind::ProducerUnlocked), 0);
    }

    #[test]
    fn suppressed_kind_is_neither_recorded_nor_delivered() {
        let mut bus = EventBus::default();
        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        bus.subscribe(
            EventKind::ProducerUnlocked,
            Box::new(move |_| *c.borrow_mut() += 1),
        );

        bus.suppress(EventKind::ProducerUnlocked);
        assert!(!bus.has_listeners(EventKind::ProducerUnlocked));
        bus.emit(unlocked("a"));
        assert_eq!(*count.borrow(), 0);
        assert!(bus.history().is_empty());

        bus.unsuppress(EventKind::ProducerUnlocked);
        bus.emit(unlocked("b"));
        assert_eq!(*count.borrow(), 1);
        assert_eq!(bus.recent().count(), 1);
    }

    #[test]
    fn kind_names_match_wire_names() {
        let names: Vec<&str> = EventKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(
            names,
            vec![
                "producerUnlocked",
                "upgradeUnlocked",
                "upgradePurchased",
                "achievementUnlocked",
                "gameStateChanged"
            ]
        );
    }
}
