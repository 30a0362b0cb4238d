//! Typed publish/subscribe for engine notifications.

use crate::{Solution, VideoInfo};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq)]
pub enum EngineEvent {
    /// The source delivered its first frame.
    VideoReady(VideoInfo),
    /// The published solved digits changed, including to or from `None`.
    SolutionChanged(Option<Arc<Solution>>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventFilter {
    All,
    VideoReady,
    SolutionChanged,
}

impl EventFilter {
    pub fn accepts(self, event: &EngineEvent) -> bool {
        matches!(
            (self, event),
            (EventFilter::All, _)
                | (EventFilter::VideoReady, EngineEvent::VideoReady(_))
                | (EventFilter::SolutionChanged, EngineEvent::SolutionChanged(_))
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Handle returned by [`EventBus::subscribe`]. Dropping the receiver
/// unsubscribes lazily; [`EventBus::unsubscribe`] does it immediately.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub receiver: Receiver<EngineEvent>,
}

struct Subscriber {
    id: SubscriptionId,
    filter: EventFilter,
    sender: Sender<EngineEvent>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: Vec<Subscriber>,
}

/// Cloneable; clones share subscribers.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, filter: EventFilter) -> Subscription {
        let (sender, receiver) = unbounded();
        let mut reg = self.registry.lock();
        let id = SubscriptionId(reg.next_id);
        reg.next_id += 1;
        reg.subscribers.push(Subscriber {
            id,
            filter,
            sender,
        });
        Subscription { id, receiver }
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut reg = self.registry.lock();
        let before = reg.subscribers.len();
        reg.subscribers.retain(|s| s.id != id);
        reg.subscribers.len() != before
    }

    /// Deliver `event` to every matching subscriber; subscribers whose
    /// receiver is gone are dropped.
    pub fn publish(&self, event: EngineEvent) {
        let mut reg = self.registry.lock();
        reg.subscribers
            .retain(|s| !s.filter.accepts(&event) || s.sender.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready() -> EngineEvent {
        EngineEvent::VideoReady(VideoInfo {
            width: 640,
            height: 480,
        })
    }

    #[test]
    fn filters_by_kind() {
        let bus = EventBus::new();
        let video = bus.subscribe(EventFilter::VideoReady);
        let solutions = bus.subscribe(EventFilter::SolutionChanged);
        let all = bus.subscribe(EventFilter::All);

        bus.publish(ready());
        bus.publish(EngineEvent::SolutionChanged(None));

        assert_eq!(video.receiver.try_iter().collect::<Vec<_>>(), vec![ready()]);
        assert_eq!(
            solutions.receiver.try_iter().collect::<Vec<_>>(),
            vec![EngineEvent::SolutionChanged(None)]
        );
        assert_eq!(all.receiver.try_iter().count(), 2);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let sub = bus.subscribe(EventFilter::All);
        assert!(bus.unsubscribe(sub.id));
        assert!(!bus.unsubscribe(sub.id));
        bus.publish(ready());
        assert!(sub.receiver.try_recv().is_err());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let bus = EventBus::new();
        let keep = bus.subscribe(EventFilter::All);
        drop(bus.subscribe(EventFilter::All));
        bus.publish(ready());
        assert_eq!(bus.subscriber_count(), 1);
        assert_eq!(keep.receiver.len(), 1);
    }
}
