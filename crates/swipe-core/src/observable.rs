#![forbid(unsafe_code)]

//! Thread-safe, versioned value cell with change notification.
//!
//! # Design
//!
//! [`Observable<T>`] keeps the current value behind an [`ArcSwap`], so
//! readers on any thread get a complete value without taking a lock and
//! never see a half-written one. Writers call [`publish`](Observable::publish)
//! while they hold whatever lock serializes their updates, then call
//! [`notify`](Observable::notify) after releasing it. Subscribers therefore
//! never run inside the writer's critical section.
//!
//! # Delivery
//!
//! `notify` hands each live subscriber the *latest* published value. A
//! version already delivered is not delivered again, so back-to-back
//! notifies after a single publish fire once. Intermediate versions
//! published between two notifies are coalesced. Notifies racing on
//! different threads may deliver out of version order; subscribers that
//! care compare [`Versioned::version`].
//!
//! # Failure Modes
//!
//! - **Subscriber leak**: holding [`Subscription`] guards forever keeps
//!   callbacks alive. Dead entries are pruned lazily during `notify`.
//! - **Poisoned subscriber list**: recovered; a panicking subscriber does
//!   not stop later notifications.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use arc_swap::ArcSwap;
use tracing::trace_span;

/// Values that carry a monotonically increasing publication counter.
pub trait Versioned {
    fn version(&self) -> u64;
}

type CallbackArc<T> = Arc<dyn Fn(&T) + Send + Sync>;
type CallbackWeak<T> = Weak<dyn Fn(&T) + Send + Sync>;

/// A shared, lock-free-to-read value with subscribers.
pub struct Observable<T> {
    current: ArcSwap<T>,
    delivered: AtomicU64,
    subscribers: Mutex<Vec<CallbackWeak<T>>>,
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscriber_count = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("Observable")
            .field("value", &*self.current.load())
            .field("subscriber_count", &subscriber_count)
            .finish()
    }
}

impl<T: Versioned + Send + Sync + 'static> Observable<T> {
    /// Create a cell holding `value`. Nothing is delivered for it.
    #[must_use]
    pub fn new(value: T) -> Self {
        let delivered = AtomicU64::new(value.version());
        Self {
            current: ArcSwap::from_pointee(value),
            delivered,
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Current value. Wait-free.
    #[must_use]
    pub fn load(&self) -> Arc<T> {
        self.current.load_full()
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        T::clone(&self.current.load())
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.current.load().version()
    }

    /// Replace the current value without notifying.
    pub fn publish(&self, value: T) {
        self.current.store(Arc::new(value));
    }

    /// Subscribe to published values.
    ///
    /// Dropping the returned [`Subscription`] unsubscribes; the callback is
    /// not called after the guard is gone.
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let strong: CallbackArc<T> = Arc::new(callback);
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Deliver the latest value to live subscribers, in registration order.
    ///
    /// Returns the number of callbacks invoked.
    pub fn notify(&self) -> usize {
        let value = self.current.load_full();
        let version = value.version();
        if self.delivered.fetch_max(version, Ordering::AcqRel) >= version {
            return 0;
        }

        let callbacks: Vec<CallbackArc<T>> = {
            let mut subs = self
                .subscribers
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            subs.retain(|w| w.strong_count() > 0);
            subs.iter().filter_map(Weak::upgrade).collect()
        };
        if callbacks.is_empty() {
            return 0;
        }

        let _span = trace_span!("swipe.snapshot.notify", version, subscribers = callbacks.len())
            .entered();
        for cb in &callbacks {
            cb(&value);
        }
        callbacks.len()
    }
}

/// RAII guard for a subscriber callback.
pub struct Subscription {
    _guard: Box<dyn std::any::Any + Send + Sync>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[derive(Debug, Clone, PartialEq)]
    struct Pair {
        version: u64,
        a: u64,
        b: u64,
    }

    impl Versioned for Pair {
        fn version(&self) -> u64 {
            self.version
        }
    }

    fn pair(version: u64) -> Pair {
        Pair {
            version,
            a: version * 3,
            b: version * 7,
        }
    }

    #[test]
    fn publish_then_load() {
        let cell = Observable::new(pair(0));
        assert_eq!(cell.version(), 0);
        cell.publish(pair(1));
        assert_eq!(cell.get(), pair(1));
        assert_eq!(cell.load().version, 1);
    }

    #[test]
    fn publish_alone_does_not_notify() {
        let cell = Observable::new(pair(0));
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let _sub = cell.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        cell.publish(pair(1));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(cell.notify(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn notify_delivers_latest_and_coalesces() {
        let cell = Observable::new(pair(0));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let _sub = cell.subscribe(move |p: &Pair| s.lock().unwrap().push(p.version));
        cell.publish(pair(1));
        cell.publish(pair(2));
        cell.publish(pair(3));
        cell.notify();
        assert_eq!(*seen.lock().unwrap(), vec![3]);
    }

    #[test]
    fn repeated_notify_fires_once() {
        let cell = Observable::new(pair(0));
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let _sub = cell.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        cell.publish(pair(1));
        assert_eq!(cell.notify(), 1);
        assert_eq!(cell.notify(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn initial_value_never_delivered() {
        let cell = Observable::new(pair(0));
        let _sub = cell.subscribe(|_| panic!("unexpected delivery"));
        assert_eq!(cell.notify(), 0);
    }

    #[test]
    fn dropped_subscription_is_pruned() {
        let cell = Observable::new(pair(0));
        let hits = Arc::new(AtomicUsize::new(0));
        let h = Arc::clone(&hits);
        let sub = cell.subscribe(move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(cell.subscriber_count(), 1);
        drop(sub);
        cell.publish(pair(1));
        assert_eq!(cell.notify(), 0);
        assert_eq!(cell.subscriber_count(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn registration_order() {
        let cell = Observable::new(pair(0));
        let log = Arc::new(Mutex::new(Vec::new()));
        let subs: Vec<_> = (0..3)
            .map(|i| {
                let l = Arc::clone(&log);
                cell.subscribe(move |_| l.lock().unwrap().push(i))
            })
            .collect();
        cell.publish(pair(1));
        cell.notify();
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
        drop(subs);
    }

    #[test]
    fn concurrent_readers_never_see_torn_values() {
        let cell = Arc::new(Observable::new(pair(0)));
        let writer = {
            let cell = Arc::clone(&cell);
            thread::spawn(move || {
                for v in 1..=2_000 {
                    cell.publish(pair(v));
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cell = Arc::clone(&cell);
                thread::spawn(move || {
                    let mut last = 0;
                    for _ in 0..2_000 {
                        let p = cell.load();
                        assert_eq!(p.a, p.version * 3);
                        assert_eq!(p.b, p.version * 7);
                        assert!(p.version >= last);
                        last = p.version;
                    }
                })
            })
            .collect();
        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(cell.version(), 2_000);
    }

    #[test]
    fn is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Observable<Pair>>();
        assert_send_sync::<Subscription>();
    }

    #[test]
    fn debug_format() {
        let cell = Observable::new(pair(2));
        let dbg = format!("{cell:?}");
        assert!(dbg.contains("Observable"));
        assert!(dbg.contains("subscriber_count"));
    }
}
