//! Publish/subscribe fan-out for client notifications.
//!
//! A [`CallbackRegistry`] holds shared callbacks of one signature. Triggering
//! calls every callback registered at that moment, in registration order,
//! on the caller's task:
//!
//! ```text
//!   register(a) ─┐
//!   register(b) ─┼─► { 1: a, 2: b } ── trigger ──► snapshot [a, b] ──► a(..), b(..)
//!   register(c) ─┘        ▲                                 │
//!                         └──── c registered by a(..) ──────┘ (not called this round)
//! ```
//!
//! Callbacks run over a snapshot taken before the first call, so a callback
//! may register, unregister or trigger again without deadlocking.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::trace;

/// Identifies one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackHandle(u64);

struct Entries<F: ?Sized> {
    next_id: u64,
    callbacks: BTreeMap<u64, Arc<F>>,
}

/// A set of callbacks of type `F`, usually a `dyn Fn(..) + Send + Sync`.
///
/// Cloning yields another handle to the same set.
pub struct CallbackRegistry<F: ?Sized> {
    entries: Arc<Mutex<Entries<F>>>,
}

impl<F: ?Sized> Clone for CallbackRegistry<F> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<F: ?Sized> Default for CallbackRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> fmt::Debug for CallbackRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl<F: ?Sized> CallbackRegistry<F> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Entries {
                next_id: 1,
                callbacks: BTreeMap::new(),
            })),
        }
    }

    /// Adds `callback`. It stays registered until
    /// [`unregister`](Self::unregister) is called with the returned handle.
    pub fn register(&self, callback: Arc<F>) -> CallbackHandle {
        let mut entries = self.lock();
        let id = entries.next_id;
        entries.next_id += 1;
        entries.callbacks.insert(id, callback);
        trace!(handle = id, "callback registered");
        CallbackHandle(id)
    }

    /// Like [`register`](Self::register), but the callback is removed when
    /// the returned guard is dropped.
    pub fn subscribe(&self, callback: Arc<F>) -> Subscription<F> {
        let handle = self.register(callback);
        Subscription {
            entries: Arc::downgrade(&self.entries),
            handle,
        }
    }

    /// Removes a callback. Returns whether it was still registered.
    pub fn unregister(&self, handle: CallbackHandle) -> bool {
        let removed = self.lock().callbacks.remove(&handle.0).is_some();
        trace!(handle = handle.0, removed, "callback unregistered");
        removed
    }

    /// Calls `invoke` once for every callback registered right now.
    pub fn trigger(&self, mut invoke: impl FnMut(&F)) {
        let snapshot: Vec<Arc<F>> = self.lock().callbacks.values().cloned().collect();
        for callback in &snapshot {
            invoke(callback);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Entries<F>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Keeps a callback registered for as long as it lives.
#[must_use = "dropping a Subscription unregisters its callback"]
pub struct Subscription<F: ?Sized> {
    entries: Weak<Mutex<Entries<F>>>,
    handle: CallbackHandle,
}

impl<F: ?Sized> Subscription<F> {
    pub fn handle(&self) -> CallbackHandle {
        self.handle
    }

    /// Leaves the callback registered for good and returns its handle.
    pub fn detach(mut self) -> CallbackHandle {
        self.entries = Weak::new();
        self.handle
    }
}

impl<F: ?Sized> fmt::Debug for Subscription<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("handle", &self.handle)
            .finish()
    }
}

impl<F: ?Sized> Drop for Subscription<F> {
    fn drop(&mut self) {
        if let Some(entries) = self.entries.upgrade() {
            entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .callbacks
                .remove(&self.handle.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Listener = dyn Fn(&str) + Send + Sync;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&'static str) -> Arc<Listener>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let make = {
            let seen = Arc::clone(&seen);
            move |name: &'static str| -> Arc<Listener> {
                let seen = Arc::clone(&seen);
                Arc::new(move |arg: &str| seen.lock().unwrap().push(format!("{name}:{arg}")))
            }
        };
        (seen, make)
    }

    #[test]
    fn test_trigger_calls_in_registration_order() {
        let registry = CallbackRegistry::<Listener>::new();
        let (seen, make) = recorder();
        registry.register(make("a"));
        registry.register(make("b"));
        registry.register(make("c"));

        registry.trigger(|cb| cb("x"));
        assert_eq!(*seen.lock().unwrap(), vec!["a:x", "b:x", "c:x"]);
    }

    #[test]
    fn test_trigger_with_no_callbacks_is_noop() {
        let registry = CallbackRegistry::<Listener>::new();
        let mut calls = 0;
        registry.trigger(|_| calls += 1);
        assert_eq!(calls, 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unregister_removes_callback() {
        let registry = CallbackRegistry::<Listener>::new();
        let (seen, make) = recorder();
        let a = registry.register(make("a"));
        registry.register(make("b"));

        assert!(registry.unregister(a));
        assert!(!registry.unregister(a));
        registry.trigger(|cb| cb("x"));
        assert_eq!(*seen.lock().unwrap(), vec!["b:x"]);
    }

    #[test]
    fn test_subscription_drop_unregisters() {
        let registry = CallbackRegistry::<Listener>::new();
        let (_seen, make) = recorder();
        let subscription = registry.subscribe(make("a"));
        assert_eq!(registry.len(), 1);
        drop(subscription);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_subscription_detach_keeps_callback() {
        let registry = CallbackRegistry::<Listener>::new();
        let (_seen, make) = recorder();
        let handle = registry.subscribe(make("a")).detach();
        assert_eq!(registry.len(), 1);
        assert!(registry.unregister(handle));
    }

    #[test]
    fn test_subscription_outliving_registry_is_harmless() {
        let registry = CallbackRegistry::<Listener>::new();
        let (_seen, make) = recorder();
        let subscription = registry.subscribe(make("a"));
        drop(registry);
        drop(subscription);
    }

    // =========================================================================
    // Re-entrancy
    // =========================================================================

    #[test]
    fn test_trigger_callback_registering_during_trigger_not_called() {
        let registry = CallbackRegistry::<Listener>::new();
        let (seen, make) = recorder();
        let late = make("late");
        {
            let registry = registry.clone();
            let seen = Arc::clone(&seen);
            registry.clone().register(Arc::new(move |arg: &str| {
                seen.lock().unwrap().push(format!("first:{arg}"));
                registry.register(Arc::clone(&late));
            }));
        }

        registry.trigger(|cb| cb("1"));
        assert_eq!(*seen.lock().unwrap(), vec!["first:1"]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_trigger_callback_unregistering_sibling_does_not_crash() {
        let registry = CallbackRegistry::<Listener>::new();
        let (seen, make) = recorder();
        let victim = Arc::new(Mutex::new(None::<CallbackHandle>));
        {
            let registry = registry.clone();
            let victim = Arc::clone(&victim);
            registry.clone().register(Arc::new(move |_: &str| {
                if let Some(handle) = victim.lock().unwrap().take() {
                    registry.unregister(handle);
                }
            }));
        }
        *victim.lock().unwrap() = Some(registry.register(make("b")));

        // The snapshot was taken before `b` went away.
        registry.trigger(|cb| cb("1"));
        assert_eq!(*seen.lock().unwrap(), vec!["b:1"]);

        registry.trigger(|cb| cb("2"));
        assert_eq!(*seen.lock().unwrap(), vec!["b:1"]);
    }

    #[test]
    fn test_trigger_nested_trigger_does_not_deadlock() {
        let registry = CallbackRegistry::<Listener>::new();
        let (seen, make) = recorder();
        {
            let registry = registry.clone();
            registry.clone().register(Arc::new(move |arg: &str| {
                if arg == "outer" {
                    registry.trigger(|cb| cb("inner"));
                }
            }));
        }
        registry.register(make("b"));

        registry.trigger(|cb| cb("outer"));
        assert_eq!(*seen.lock().unwrap(), vec!["b:inner", "b:outer"]);
    }
}
