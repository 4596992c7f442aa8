use crate::types::RealtimeEvent;
use std::collections::VecDeque;

/// FIFO buffer of outbound events awaiting transmission.
///
/// Bounded by `capacity` with drop-oldest eviction; a capacity of zero
/// disables the bound.
#[derive(Debug, Default)]
pub struct MessageQueue {
    items: VecDeque<RealtimeEvent>,
    capacity: usize,
}

impl MessageQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::new(),
            capacity,
        }
    }

    /// Appends to the tail, returning the evicted head if the queue was full
    pub fn push(&mut self, event: RealtimeEvent) -> Option<RealtimeEvent> {
        let evicted = if self.capacity > 0 && self.items.len() >= self.capacity {
            self.items.pop_front()
        } else {
            None
        };
        self.items.push_back(event);
        evicted
    }

    /// Takes every queued event in FIFO order
    pub fn drain(&mut self) -> Vec<RealtimeEvent> {
        self.items.drain(..).collect()
    }

    /// Changes the bound, evicting from the head if needed; returns the evicted events
    pub fn set_capacity(&mut self, capacity: usize) -> Vec<RealtimeEvent> {
        self.capacity = capacity;
        let mut evicted = Vec::new();
        while capacity > 0 && self.items.len() > capacity {
            if let Some(event) = self.items.pop_front() {
                evicted.push(event);
            }
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RealtimeEvent> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(game: &str) -> RealtimeEvent {
        RealtimeEvent::like(game, "u1")
    }

    fn games(events: &[RealtimeEvent]) -> Vec<String> {
        events.iter().filter_map(|e| e.game_id.clone()).collect()
    }

    #[test]
    fn test_drain_preserves_fifo_order() {
        let mut queue = MessageQueue::new(10);
        queue.push(event("a"));
        queue.push(event("b"));
        queue.push(event("c"));

        let drained = queue.drain();
        assert_eq!(games(&drained), vec!["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_full_queue_drops_oldest() {
        let mut queue = MessageQueue::new(2);
        assert!(queue.push(event("a")).is_none());
        assert!(queue.push(event("b")).is_none());

        let evicted = queue.push(event("c")).unwrap();
        assert_eq!(evicted.game_id.as_deref(), Some("a"));
        assert_eq!(queue.len(), 2);
        assert_eq!(games(&queue.drain()), vec!["b", "c"]);
    }

    #[test]
    fn test_zero_capacity_is_unbounded() {
        let mut queue = MessageQueue::new(0);
        for i in 0..5000 {
            assert!(queue.push(event(&i.to_string())).is_none());
        }
        assert_eq!(queue.len(), 5000);
    }

    #[test]
    fn test_shrinking_capacity_evicts_head() {
        let mut queue = MessageQueue::new(5);
        for game in ["a", "b", "c", "d"] {
            queue.push(event(game));
        }

        let evicted = queue.set_capacity(2);
        assert_eq!(games(&evicted), vec!["a", "b"]);
        queue.push(event("e"));
        assert_eq!(
            queue.iter().filter_map(|e| e.game_id.as_deref()).collect::<Vec<_>>(),
            vec!["d", "e"]
        );
    }
}
