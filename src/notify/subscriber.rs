//! Subscriber-based event notifications.

use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Handle for a subscription that can be dropped to unsubscribe.
///
/// When the handle is dropped, the subscription is removed immediately.
/// Use [`detach`](Self::detach) to keep the subscriber for the lifetime of
/// the registry instead.
#[must_use = "dropping the handle removes the subscription"]
pub struct SubscriptionHandle {
    id: usize,
    registry: Option<Weak<dyn Unsubscribe>>,
}

impl SubscriptionHandle {
    /// Remove the subscription now.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keep the subscription alive without holding on to the handle.
    pub fn detach(mut self) {
        self.registry = None;
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.take().and_then(|weak| weak.upgrade()) {
            registry.remove(self.id);
        }
    }
}

trait Unsubscribe: Send + Sync {
    fn remove(&self, id: usize);
}

/// Internal subscriber registry state.
struct SubscriberRegistryInner<E> {
    subscribers: Vec<(usize, Callback<E>)>,
    next_id: usize,
}

impl<E> Unsubscribe for RwLock<SubscriberRegistryInner<E>> {
    fn remove(&self, id: usize) {
        self.write().subscribers.retain(|(sub_id, _)| *sub_id != id);
    }
}

/// Multicast registry of event subscribers.
///
/// Every subscriber receives every event published after it subscribed, in
/// subscription order. Past events are not replayed.
///
/// # Examples
///
/// ```rust
/// use pollwatch::notify::SubscriberRegistry;
///
/// let registry: SubscriberRegistry<String> = SubscriberRegistry::new();
///
/// let handle = registry.subscribe(|event: &String| {
///     println!("got {}", event);
/// });
///
/// registry.notify_all(&"hello".to_string());
///
/// // Unsubscribe by dropping the handle
/// drop(handle);
/// assert_eq!(registry.subscriber_count(), 0);
/// ```
pub struct SubscriberRegistry<E> {
    inner: Arc<RwLock<SubscriberRegistryInner<E>>>,
}

impl<E: 'static> SubscriberRegistry<E> {
    /// Create a new subscriber registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SubscriberRegistryInner {
                subscribers: Vec::new(),
                next_id: 0,
            })),
        }
    }

    /// Register a callback invoked for every published event.
    ///
    /// Returns a handle that can be dropped to unsubscribe.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Arc::new(callback)));

        let registry: Arc<dyn Unsubscribe> = self.inner.clone();
        SubscriptionHandle {
            id,
            registry: Some(Arc::downgrade(&registry)),
        }
    }

    /// Subscribe through an unbounded channel instead of a callback.
    pub fn subscribe_channel(&self) -> EventStream<E>
    where
        E: Clone + Send,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = self.subscribe(move |event: &E| {
            let _ = tx.send(event.clone());
        });
        EventStream { rx, _handle: handle }
    }

    /// Deliver `event` to all current subscribers.
    ///
    /// Callbacks run outside the registry lock, so a callback may subscribe
    /// or unsubscribe without deadlocking.
    pub fn notify_all(&self, event: &E) {
        let callbacks: Vec<Callback<E>> = self
            .inner
            .read()
            .subscribers
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for callback in callbacks {
            callback(event);
        }
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.read().subscribers.len()
    }
}

impl<E: 'static> Default for SubscriberRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for SubscriberRegistry<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Receiving end of a channel subscription.
///
/// Dropping the stream unsubscribes.
pub struct EventStream<E> {
    rx: mpsc::UnboundedReceiver<E>,
    _handle: SubscriptionHandle,
}

impl<E> EventStream<E> {
    /// Wait for the next event.
    ///
    /// Returns `None` once the publishing side is gone and the buffer is empty.
    pub async fn recv(&mut self) -> Option<E> {
        self.rx.recv().await
    }

    /// Take the next buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<E> {
        self.rx.try_recv().ok()
    }

    /// Take every buffered event without waiting.
    pub fn drain(&mut self) -> Vec<E> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}
