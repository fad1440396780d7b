use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::HandlerResult;
use crate::event::Topic;
use crate::id_generator::generate_id;

/// A listener callback. Identity (the `Rc` allocation) is what `unsubscribe` matches on.
pub type Listener<P> = Rc<dyn Fn(&P) -> HandlerResult>;

/// Handle returned by `subscribe`, usable with [`EventBus::unsubscribe_id`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscription<P> {
    id: SubscriptionId,
    listener: Listener<P>,
    once: bool,
    /// Cleared on removal so an in-flight emission skips it
    active: Rc<Cell<bool>>,
}

impl<P> Clone for Subscription<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            listener: Rc::clone(&self.listener),
            once: self.once,
            active: Rc::clone(&self.active),
        }
    }
}

/// A publish/subscribe registry mapping topics to ordered listener lists.
///
/// Emission is synchronous. The listener list is snapshotted before dispatch,
/// so listeners may subscribe, unsubscribe or emit again from inside a callback.
pub struct EventBus<P> {
    topics: RefCell<HashMap<Topic, Vec<Subscription<P>>>>,
}

impl<P> std::fmt::Debug for EventBus<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let topics = self.topics.borrow();
        let listeners: usize = topics.values().map(Vec::len).sum();
        f.debug_struct("EventBus")
            .field("topics", &topics.len())
            .field("listeners", &format!("<{} listeners>", listeners))
            .finish()
    }
}

impl<P> Default for EventBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> EventBus<P> {
    /// Creates a new event bus
    pub fn new() -> Self {
        Self {
            topics: RefCell::new(HashMap::new()),
        }
    }

    /// Register `listener` for `topic`. Unknown topics are created on demand.
    pub fn subscribe(&self, topic: impl Into<Topic>, listener: Listener<P>) -> SubscriptionId {
        self.insert(topic.into(), listener, false)
    }

    /// Register `listener` for a single emission of `topic`.
    ///
    /// The registration is removed before the listener runs, so a nested emit
    /// from inside the listener cannot fire it a second time.
    pub fn subscribe_once(&self, topic: impl Into<Topic>, listener: Listener<P>) -> SubscriptionId {
        self.insert(topic.into(), listener, true)
    }

    /// Remove every registration of `listener` on `topic`. Unknown pairs are ignored.
    pub fn unsubscribe(&self, topic: &Topic, listener: &Listener<P>) {
        self.remove_where(Some(topic), |sub| Rc::ptr_eq(&sub.listener, listener));
    }

    /// Remove the registration behind `id`, whatever its topic. Unknown ids are ignored.
    pub fn unsubscribe_id(&self, id: SubscriptionId) {
        self.remove_where(None, |sub| sub.id == id);
    }

    /// Clear one topic, or every topic when `topic` is `None`
    pub fn unsubscribe_all(&self, topic: Option<&Topic>) {
        self.remove_where(topic, |_| true);
    }

    /// Invoke every listener currently registered for `topic`, in subscription order.
    ///
    /// Returns whether any listener was registered when the emission started.
    /// A failing listener is logged and does not stop the remaining ones.
    pub fn emit(&self, topic: &Topic, payload: &P) -> bool {
        let subscriptions = {
            let topics = self.topics.borrow();
            match topics.get(topic) {
                Some(subscriptions) if !subscriptions.is_empty() => subscriptions.clone(),
                _ => return false,
            }
        };

        log::debug!("emit '{}' to {} listener(s)", topic, subscriptions.len());
        for subscription in subscriptions {
            if !subscription.active.get() {
                continue;
            }
            if subscription.once {
                let id = subscription.id;
                self.remove_where(Some(topic), |sub| sub.id == id);
            }
            if let Err(err) = (subscription.listener)(payload) {
                log::error!("Listener for '{}' failed: {}", topic, err);
            }
        }
        true
    }

    /// Number of live registrations for `topic`
    pub fn listener_count(&self, topic: &Topic) -> usize {
        self.topics.borrow().get(topic).map_or(0, Vec::len)
    }

    /// Topics with at least one listener, sorted
    pub fn topics(&self) -> Vec<Topic> {
        let mut topics: Vec<Topic> = self.topics.borrow().keys().cloned().collect();
        topics.sort();
        topics
    }

    fn insert(&self, topic: Topic, listener: Listener<P>, once: bool) -> SubscriptionId {
        let id = SubscriptionId(generate_id());
        self.topics
            .borrow_mut()
            .entry(topic)
            .or_default()
            .push(Subscription {
                id,
                listener,
                once,
                active: Rc::new(Cell::new(true)),
            });
        id
    }

    fn remove_where(&self, topic: Option<&Topic>, mut matches: impl FnMut(&Subscription<P>) -> bool) {
        let mut topics = self.topics.borrow_mut();
        let mut prune = |subscriptions: &mut Vec<Subscription<P>>| {
            subscriptions.retain(|sub| {
                if matches(sub) {
                    sub.active.set(false);
                    false
                } else {
                    true
                }
            });
        };

        match topic {
            Some(topic) => {
                if let Some(subscriptions) = topics.get_mut(topic) {
                    prune(subscriptions);
                }
            }
            None => topics.values_mut().for_each(&mut prune),
        }
        topics.retain(|_, subscriptions| !subscriptions.is_empty());
    }
}
