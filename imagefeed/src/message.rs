use std::ops::Range;

use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Published by the feed worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedEvent {
    /// A page grew the collection from `old_count` to `new_count` photos.
    Changed { old_count: usize, new_count: usize },
    /// The collection was cleared; anything derived from it must be rebuilt.
    Reset,
}

impl FeedEvent {
    /// Indices appended by a `Changed` event.
    pub fn inserted(&self) -> Option<Range<usize>> {
        match self {
            FeedEvent::Changed {
                old_count,
                new_count,
            } => Some(*old_count..*new_count),
            FeedEvent::Reset => None,
        }
    }
}

/// Published by the profile image service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AvatarEvent {
    Changed { url: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A registered subscriber: its id (for `unsubscribe`) and its event stream.
#[derive(Debug)]
pub struct Subscription<E> {
    pub id: SubscriptionId,
    pub events: UnboundedReceiver<E>,
}

impl<E> Subscription<E> {
    pub async fn recv(&mut self) -> Option<E> {
        self.events.recv().await
    }

    pub fn try_recv(&mut self) -> Option<E> {
        self.events.try_recv().ok()
    }
}

/// The subscriber list of one event source.
///
/// Subscribers whose receiver was dropped are forgotten on the next publish.
#[derive(Debug)]
pub struct Subscribers<E> {
    next_id: u64,
    senders: Vec<(SubscriptionId, UnboundedSender<E>)>,
}

impl<E> Default for Subscribers<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            senders: Vec::new(),
        }
    }
}

impl<E: Clone> Subscribers<E> {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn subscribe(&mut self) -> Subscription<E> {
        let (sender, events) = mpsc::unbounded_channel();
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.senders.push((id, sender));
        debug!("subscriber {id:?} registered");
        Subscription { id, events }
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.senders.len();
        self.senders.retain(|(sid, _)| *sid != id);
        before != self.senders.len()
    }

    pub fn publish(&mut self, event: E) {
        self.senders
            .retain(|(_, sender)| sender.send(event.clone()).is_ok());
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}
