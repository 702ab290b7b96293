//! Logout dispatcher.
//!
//! A value injected into [`ApiClient`](crate::ApiClient) that fans a 401
//! out to every subscriber. Subscribers run in subscription order. The
//! dispatcher does not deduplicate: two requests failing with 401 at the
//! same time invoke every subscriber twice, so subscribers must be
//! idempotent.

use std::sync::{Arc, PoisonError, RwLock};

/// Something that reacts to the server reporting the session is gone.
pub trait LogoutHandler: Send + Sync {
    fn on_unauthorized(&self);
}

/// Handle returned by [`LogoutDispatcher::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct FnHandler<F>(F);

impl<F> LogoutHandler for FnHandler<F>
where
    F: Fn() + Send + Sync,
{
    fn on_unauthorized(&self) {
        (self.0)();
    }
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Arc<dyn LogoutHandler>)>,
}

/// Ordered list of logout subscribers. Cloning shares the list.
#[derive(Clone, Default)]
pub struct LogoutDispatcher {
    inner: Arc<RwLock<Subscribers>>,
}

impl std::fmt::Debug for LogoutDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogoutDispatcher")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl LogoutDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber.
    pub fn subscribe(&self, handler: Arc<dyn LogoutHandler>) -> SubscriptionId {
        let mut subscribers = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let id = SubscriptionId(subscribers.next_id);
        subscribers.next_id += 1;
        subscribers.handlers.push((id, handler));
        id
    }

    /// Add a closure as a subscriber.
    pub fn subscribe_fn<F>(&self, f: F) -> SubscriptionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribe(Arc::new(FnHandler(f)))
    }

    /// Remove a subscriber. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = subscribers.handlers.len();
        subscribers.handlers.retain(|(sub, _)| *sub != id);
        subscribers.handlers.len() != before
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .handlers
            .len()
    }

    /// Invoke every subscriber. Returns how many ran.
    pub fn dispatch(&self) -> usize {
        // Snapshot so a handler may (un)subscribe without deadlocking.
        let handlers: Vec<Arc<dyn LogoutHandler>> = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .handlers
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();

        tracing::debug!(subscribers = handlers.len(), "dispatching logout");
        for handler in &handlers {
            handler.on_unauthorized();
        }
        handlers.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_dispatch_reaches_every_subscriber_in_order() {
        let dispatcher = LogoutDispatcher::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for name in ["guard", "expiry", "cache"] {
            let log = Arc::clone(&log);
            dispatcher.subscribe_fn(move || log.lock().unwrap_or_else(PoisonError::into_inner).push(name));
        }

        assert_eq!(dispatcher.dispatch(), 3);
        assert_eq!(
            *log.lock().unwrap_or_else(PoisonError::into_inner),
            vec!["guard", "expiry", "cache"]
        );
    }

    #[test]
    fn test_unsubscribe() {
        let dispatcher = LogoutDispatcher::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let id = dispatcher.subscribe_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(dispatcher.unsubscribe(id));
        assert!(!dispatcher.unsubscribe(id));
        assert_eq!(dispatcher.dispatch(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_repeated_dispatch_is_not_deduplicated() {
        let dispatcher = LogoutDispatcher::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        dispatcher.subscribe_fn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        dispatcher.dispatch();
        dispatcher.clone().dispatch();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_handler_may_unsubscribe_itself() {
        let dispatcher = LogoutDispatcher::new();
        let slot: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));

        let inner = dispatcher.clone();
        let own_id = Arc::clone(&slot);
        let id = dispatcher.subscribe_fn(move || {
            if let Some(id) = *own_id.lock().unwrap_or_else(PoisonError::into_inner) {
                inner.unsubscribe(id);
            }
        });
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(id);

        assert_eq!(dispatcher.dispatch(), 1);
        assert_eq!(dispatcher.subscriber_count(), 0);
    }
}
