use serde::Serialize;
use tracing::debug;

/// One recorded pipeline event.
///
/// `seq` is assigned by the bus and strictly increases, so consumers can poll
/// with [`EventBus::since`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub seq: u64,
    pub kind: &'static str,
    pub message: String,
}

/// Bounded event log: once `capacity` events are held, the oldest are
/// dropped as new ones arrive.
#[derive(Debug)]
pub struct EventBus {
    next_seq: u64,
    capacity: usize,
    events: Vec<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }
}

impl EventBus {
    pub const DEFAULT_CAPACITY: usize = 512;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            next_seq: 0,
            capacity: capacity.max(1),
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, kind: &'static str, message: impl Into<String>) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        let message = message.into();
        debug!(seq, kind, "{message}");
        self.events.push(Event { seq, kind, message });
        if self.events.len() > self.capacity {
            let overflow = self.events.len() - self.capacity;
            self.events.drain(..overflow);
        }
        seq
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Events with `seq >= from`.
    pub fn since(&self, from: u64) -> &[Event] {
        let start = self.events.partition_point(|e| e.seq < from);
        &self.events[start..]
    }

    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Event> + 'a {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    /// Removes recorded events; sequence numbers keep counting.
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }
}
